//! Outbound instruction encoding
//!
//! Instructions travel to the display as ASCII text followed by the
//! three-byte 0xFF terminator, e.g. `page 3` or `t0.txt="Ready"`. Commands
//! are fire-and-forget; execution results come back asynchronously as
//! success/error events.

use core::fmt::Write as _;

use heapless::{String, Vec};

use crate::frame::{TERMINATOR, TERMINATOR_RUN};

/// Maximum size of one encoded command, terminator included
pub const MAX_COMMAND_SIZE: usize = 128;

const MAX_COMMAND_TEXT: usize = MAX_COMMAND_SIZE - TERMINATOR_RUN as usize;

/// Errors that can occur while encoding a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Command text does not fit in [`MAX_COMMAND_SIZE`]. Commands are
    /// never truncated; a truncated instruction would execute wrongly.
    TooLong,
}

/// An instruction for the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command<'a> {
    /// Verbatim instruction text
    Raw(&'a str),
    /// Switch the display to a page (`page N`)
    Page(u8),
    /// Ask the display to report its current page via a page-change event
    /// (`sendme`)
    QueryPage,
    /// Read an attribute; the display answers with a string or numeric
    /// return (`get t0.txt`)
    Get { attribute: &'a str },
    /// Assign a numeric value to an object (`n0.val=42`)
    Assign { object: &'a str, value: i32 },
    /// Set a component's text attribute (`t0.txt="..."`)
    SetText { component: &'a str, text: &'a str },
    /// Set a named numeric attribute on a component (`b0.pic=7`)
    SetProperty {
        component: &'a str,
        property: &'a str,
        value: i32,
    },
}

impl Command<'_> {
    /// Encode this command as instruction text plus terminator
    pub fn encode(&self) -> Result<Vec<u8, MAX_COMMAND_SIZE>, EncodeError> {
        let mut text: String<MAX_COMMAND_TEXT> = String::new();

        let formatted = match self {
            Command::Raw(cmd) => text.push_str(cmd).map_err(|_| core::fmt::Error),
            Command::Page(id) => write!(text, "page {id}"),
            Command::QueryPage => text.push_str("sendme").map_err(|_| core::fmt::Error),
            Command::Get { attribute } => write!(text, "get {attribute}"),
            Command::Assign { object, value } => write!(text, "{object}={value}"),
            Command::SetText { component, text: value } => {
                write!(text, "{component}.txt=\"{value}\"")
            }
            Command::SetProperty {
                component,
                property,
                value,
            } => write!(text, "{component}.{property}={value}"),
        };
        formatted.map_err(|_| EncodeError::TooLong)?;

        let mut encoded = Vec::new();
        // Cannot fail: text capacity plus terminator equals the buffer size
        let _ = encoded.extend_from_slice(text.as_bytes());
        for _ in 0..TERMINATOR_RUN {
            let _ = encoded.push(TERMINATOR);
        }
        Ok(encoded)
    }
}
