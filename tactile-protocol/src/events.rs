//! Display-originated events and their decoding
//!
//! Every inbound message carries a one-byte opcode followed by an
//! opcode-specific payload. Messages shorter than their opcode requires are
//! dropped; extra trailing bytes are ignored for forward compatibility.

use heapless::String;

use crate::frame::Frame;

// Command execution results
pub const OP_CMD_OK: u8 = 0x01;
pub const OP_ERR_INSTRUCTION: u8 = 0x00;
pub const OP_ERR_COMPONENT_ID: u8 = 0x02;
pub const OP_ERR_PAGE_ID: u8 = 0x03;
pub const OP_ERR_PICTURE_ID: u8 = 0x04;
pub const OP_ERR_VARIABLE: u8 = 0x1A;
pub const OP_ERR_OPERATION: u8 = 0x1B;
pub const OP_ERR_ASSIGNMENT: u8 = 0x1C;

// Asynchronous events
pub const OP_TOUCH: u8 = 0x65;
pub const OP_PAGE_CHANGE: u8 = 0x66;
pub const OP_TOUCH_XY: u8 = 0x67;
pub const OP_TOUCH_XY_SLEEP: u8 = 0x68;
pub const OP_STRING_RETURN: u8 = 0x70;
pub const OP_NUMERIC_RETURN: u8 = 0x71;
pub const OP_SLEEP_ENTER: u8 = 0x86;
pub const OP_SLEEP_EXIT: u8 = 0x87;

/// Capacity of the bounded text value delivered for string returns.
/// Longer values are truncated, not rejected.
pub const TEXT_CAPACITY: usize = 64;

/// Error codes the display reports for a failed instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Instruction was not recognized
    InvalidInstruction,
    /// Referenced component does not exist
    InvalidComponentId,
    /// Referenced page does not exist
    InvalidPageId,
    /// Referenced picture resource does not exist
    InvalidPictureId,
    /// Variable name or attribute was invalid
    InvalidVariable,
    /// Variable operation was invalid
    InvalidOperation,
    /// Attribute assignment failed
    AssignmentFailed,
}

impl CommandError {
    /// Parse an error code from its wire opcode
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            OP_ERR_INSTRUCTION => Some(CommandError::InvalidInstruction),
            OP_ERR_COMPONENT_ID => Some(CommandError::InvalidComponentId),
            OP_ERR_PAGE_ID => Some(CommandError::InvalidPageId),
            OP_ERR_PICTURE_ID => Some(CommandError::InvalidPictureId),
            OP_ERR_VARIABLE => Some(CommandError::InvalidVariable),
            OP_ERR_OPERATION => Some(CommandError::InvalidOperation),
            OP_ERR_ASSIGNMENT => Some(CommandError::AssignmentFailed),
            _ => None,
        }
    }

    /// Convert to the wire opcode
    pub fn to_byte(self) -> u8 {
        match self {
            CommandError::InvalidInstruction => OP_ERR_INSTRUCTION,
            CommandError::InvalidComponentId => OP_ERR_COMPONENT_ID,
            CommandError::InvalidPageId => OP_ERR_PAGE_ID,
            CommandError::InvalidPictureId => OP_ERR_PICTURE_ID,
            CommandError::InvalidVariable => OP_ERR_VARIABLE,
            CommandError::InvalidOperation => OP_ERR_OPERATION,
            CommandError::AssignmentFailed => OP_ERR_ASSIGNMENT,
        }
    }
}

/// Touch press/release state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchAction {
    /// Component released (wire value 0x00)
    Release,
    /// Component pressed (wire value 0x01)
    Press,
}

impl TouchAction {
    /// Parse a touch action from its wire byte
    ///
    /// The display sends 0x01 for press and 0x00 for release. Undefined
    /// values are treated as a press so the event — and the page resync a
    /// touch can carry — is never dropped over the event-type byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => TouchAction::Release,
            _ => TouchAction::Press,
        }
    }

    /// Returns true for a press
    pub fn is_press(&self) -> bool {
        matches!(self, TouchAction::Press)
    }
}

/// A decoded display-originated event
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayEvent {
    /// Instruction executed successfully
    CommandOk,
    /// Instruction failed with the given error code
    CommandFailed(CommandError),
    /// A component with touch events enabled was pressed or released
    Touch {
        page_id: u8,
        component_id: u8,
        action: TouchAction,
    },
    /// The display changed page, either on its own or in response to a
    /// page-identity query
    PageChange { page_id: u8 },
    /// Raw touch coordinates (when coordinate reporting is enabled)
    TouchCoordinate {
        x: u16,
        y: u16,
        action: TouchAction,
        /// True when the touch arrived while the display was asleep
        asleep: bool,
    },
    /// A component returned a text value
    Text(String<TEXT_CAPACITY>),
    /// A component returned a 32-bit numeric value
    Numeric(u32),
    /// Auto-sleep state changed; true when entering sleep
    SleepChange { entering: bool },
}

impl DisplayEvent {
    /// Decode an event from an assembled frame
    ///
    /// Returns `None` for unknown opcodes and for payloads shorter than the
    /// opcode requires; such frames are dropped without side effects.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        let payload = frame.payload.as_slice();

        match frame.opcode {
            OP_CMD_OK => Some(DisplayEvent::CommandOk),
            OP_ERR_INSTRUCTION | OP_ERR_COMPONENT_ID | OP_ERR_PAGE_ID | OP_ERR_PICTURE_ID
            | OP_ERR_VARIABLE | OP_ERR_OPERATION | OP_ERR_ASSIGNMENT => {
                CommandError::from_byte(frame.opcode).map(DisplayEvent::CommandFailed)
            }
            OP_TOUCH => {
                if payload.len() < 3 {
                    return None;
                }
                Some(DisplayEvent::Touch {
                    page_id: payload[0],
                    component_id: payload[1],
                    action: TouchAction::from_byte(payload[2]),
                })
            }
            OP_PAGE_CHANGE => {
                if payload.is_empty() {
                    return None;
                }
                Some(DisplayEvent::PageChange {
                    page_id: payload[0],
                })
            }
            OP_TOUCH_XY | OP_TOUCH_XY_SLEEP => {
                if payload.len() < 5 {
                    return None;
                }
                // Coordinates are big-endian on the wire
                Some(DisplayEvent::TouchCoordinate {
                    x: u16::from_be_bytes([payload[0], payload[1]]),
                    y: u16::from_be_bytes([payload[2], payload[3]]),
                    action: TouchAction::from_byte(payload[4]),
                    asleep: frame.opcode == OP_TOUCH_XY_SLEEP,
                })
            }
            OP_STRING_RETURN => Some(DisplayEvent::Text(text_from_payload(payload))),
            OP_NUMERIC_RETURN => {
                if payload.len() < 4 {
                    return None;
                }
                Some(DisplayEvent::Numeric(u32::from_le_bytes([
                    payload[0], payload[1], payload[2], payload[3],
                ])))
            }
            OP_SLEEP_ENTER | OP_SLEEP_EXIT => Some(DisplayEvent::SleepChange {
                entering: frame.opcode == OP_SLEEP_ENTER,
            }),
            _ => None,
        }
    }
}

/// Build the bounded text value for a string return
///
/// The value ends at the first NUL byte; anything beyond [`TEXT_CAPACITY`]
/// is truncated. Non-ASCII bytes are carried through as Latin-1.
fn text_from_payload(payload: &[u8]) -> String<TEXT_CAPACITY> {
    let mut text = String::new();
    for &byte in payload {
        if byte == 0 {
            break;
        }
        if text.push(byte as char).is_err() {
            break;
        }
    }
    text
}
