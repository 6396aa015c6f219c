//! Page lifecycle and event dispatch for serial HMI touch panels
//!
//! This crate contains the transport-agnostic controller for a
//! Nextion-style intelligent display:
//!
//! - [`Page`] trait: the capability interface a logical screen implements
//!   (identifier, one-time setup, enter/leave hooks, per-event handlers,
//!   periodic refresh)
//! - [`Transport`] trait and an `embedded-io` adapter for the serial link
//! - [`PanelController`]: owns the frame assembler and the page registry,
//!   routes decoded events to the active page, and keeps the believed
//!   active page in sync with what the display actually shows
//!
//! # Architecture
//!
//! The display handles rendering and touch capture; all behavior lives in
//! the host's pages. Everything runs inside a single cooperative
//! [`PanelController::poll`] call driven by the host loop — no threads, no
//! blocking, no allocation. The controller must not be polled reentrantly;
//! in a multi-threaded host, wrap the whole poll call in external mutual
//! exclusion.

#![no_std]
#![deny(unsafe_code)]

pub mod controller;
pub mod observer;
pub mod page;
pub mod transport;

pub use controller::{PanelController, SwitchError, REFRESH_INTERVAL_MS};
pub use observer::LinkObserver;
pub use page::Page;
pub use transport::{CommandSink, CommandSinkExt, IoTransport, SendError, Transport};

// Re-export the wire types page implementations interact with
pub use tactile_protocol::{Command, CommandError, DisplayEvent, TouchAction};
