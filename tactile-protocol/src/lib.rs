//! Wire protocol for Nextion-style serial HMI touch panels
//!
//! This crate implements the byte-level protocol spoken by intelligent
//! serial touch displays: the host sends ASCII instruction text, the display
//! answers with opcode-tagged event messages, and both directions terminate
//! every message with three consecutive `0xFF` bytes.
//!
//! # Protocol Overview
//!
//! ```text
//! Host → Display:   ┌──────────────────────┬────────────────┐
//!                   │ ASCII instruction    │ 0xFF 0xFF 0xFF │
//!                   └──────────────────────┴────────────────┘
//!
//! Display → Host:   ┌────────┬─────────────┬────────────────┐
//!                   │ OPCODE │ PAYLOAD     │ 0xFF 0xFF 0xFF │
//!                   │ 1B     │ 0–N bytes   │                │
//!                   └────────┴─────────────┴────────────────┘
//! ```
//!
//! There is no length prefix and no checksum; framing relies entirely on the
//! terminator run. See [`frame`] for the assembly state machine and its
//! documented ambiguity.

#![no_std]
#![deny(unsafe_code)]

pub mod commands;
pub mod events;
pub mod frame;

pub use commands::{Command, EncodeError, MAX_COMMAND_SIZE};
pub use events::{CommandError, DisplayEvent, TouchAction, TEXT_CAPACITY};
pub use frame::{Frame, FrameAssembler, FrameError, RX_BUFFER_SIZE, TERMINATOR};
