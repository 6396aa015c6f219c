//! Message framing for the display serial link.
//!
//! Inbound message format:
//! - OPCODE (1 byte): event type identifier, never 0xFF
//! - PAYLOAD (0-N bytes): opcode-specific data
//! - TERMINATOR (3 bytes): 0xFF 0xFF 0xFF
//!
//! There is no length prefix and no checksum. A message is complete when
//! three consecutive 0xFF bytes have been observed, and the terminator run
//! is excluded from the payload handed to the decoder.
//!
//! # Framing ambiguity
//!
//! Three consecutive 0xFF bytes inside payload data are indistinguishable
//! from a true terminator. The protocol assumes the display never emits such
//! a run except to end a message; this assembler inherits that assumption
//! and does not attempt to validate it.

use heapless::Vec;

/// Message terminator byte. A run of three ends a message.
pub const TERMINATOR: u8 = 0xFF;

/// Number of consecutive terminator bytes that complete a message.
pub const TERMINATOR_RUN: u8 = 3;

/// Size of the receive buffer used to assemble one in-flight message.
pub const RX_BUFFER_SIZE: usize = 256;

/// Silence (ms) after which a partial message is abandoned.
pub const RX_TIMEOUT_MS: u64 = 800;

/// Errors that can occur while assembling a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Receive buffer filled before a terminator run completed.
    /// The in-flight message is discarded.
    Overflow,
}

/// A complete message received from the display
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Event type identifier (first byte of the message)
    pub opcode: u8,
    /// Opcode-specific data, terminator excluded
    pub payload: Vec<u8, RX_BUFFER_SIZE>,
}

impl Frame {
    /// Create a frame from parts (for tests and simulation)
    pub fn new(opcode: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::Overflow)?;

        Ok(Self {
            opcode,
            payload: payload_vec,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssembleState {
    /// No message in flight; terminator bytes are trailing noise and skipped
    Idle,
    /// Accumulating bytes of one message
    Assembling,
    /// Buffer overflowed; draining bytes until the terminator run so the
    /// tail of the oversized message is not misread as a new message
    Discarding,
}

/// State machine assembling terminator-delimited messages from a byte stream
///
/// Bytes are fed one at a time together with the current time. A completed
/// message is returned as a [`Frame`]; a partial message that stalls for
/// longer than [`RX_TIMEOUT_MS`] is abandoned via [`check_timeout`].
///
/// [`check_timeout`]: FrameAssembler::check_timeout
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    state: AssembleState,
    buffer: Vec<u8, RX_BUFFER_SIZE>,
    terminator_run: u8,
    last_byte_ms: u64,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    /// Create a new idle assembler
    pub fn new() -> Self {
        Self {
            state: AssembleState::Idle,
            buffer: Vec::new(),
            terminator_run: 0,
            last_byte_ms: 0,
        }
    }

    /// Reset to the idle state, discarding any partial message
    pub fn reset(&mut self) {
        self.state = AssembleState::Idle;
        self.buffer.clear();
        self.terminator_run = 0;
    }

    /// Whether a message is currently being assembled
    pub fn is_assembling(&self) -> bool {
        self.state == AssembleState::Assembling
    }

    /// Feed a single byte to the assembler
    ///
    /// Returns `Ok(Some(frame))` when the byte completes a message,
    /// `Ok(None)` when more bytes are needed, or `Err(FrameError::Overflow)`
    /// when the byte overran the buffer and the in-flight message was lost.
    /// Overflow is recoverable: keep feeding bytes and the assembler
    /// resynchronizes on the next terminator run.
    pub fn feed(&mut self, byte: u8, now_ms: u64) -> Result<Option<Frame>, FrameError> {
        self.last_byte_ms = now_ms;

        match self.state {
            AssembleState::Idle => {
                if byte == TERMINATOR {
                    // Trailing terminator from a previous message or
                    // keep-alive padding
                    return Ok(None);
                }
                self.buffer.clear();
                self.terminator_run = 0;
                self.state = AssembleState::Assembling;
                self.accumulate(byte)
            }
            AssembleState::Assembling => self.accumulate(byte),
            AssembleState::Discarding => {
                self.track_run(byte);
                if self.terminator_run >= TERMINATOR_RUN {
                    self.reset();
                }
                Ok(None)
            }
        }
    }

    /// Abandon a stalled partial message
    ///
    /// Returns true if a partial message was discarded, in which case the
    /// caller should requery the display's page identity to resynchronize.
    pub fn check_timeout(&mut self, now_ms: u64) -> bool {
        if self.state == AssembleState::Idle {
            return false;
        }
        if now_ms.saturating_sub(self.last_byte_ms) > RX_TIMEOUT_MS {
            self.reset();
            return true;
        }
        false
    }

    fn accumulate(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        if self.buffer.push(byte).is_err() {
            // The terminator run is a property of the byte stream, not the
            // buffer: keep counting across the overflow so a run straddling
            // the boundary still ends the oversized message
            self.state = AssembleState::Discarding;
            self.track_run(byte);
            if self.terminator_run >= TERMINATOR_RUN {
                self.reset();
            }
            return Err(FrameError::Overflow);
        }

        self.track_run(byte);
        if self.terminator_run >= TERMINATOR_RUN {
            // First byte is never a terminator, so at least the opcode
            // remains once the run is stripped
            let len = self.buffer.len() - TERMINATOR_RUN as usize;
            let mut payload = Vec::new();
            // Cannot fail: len <= buffer capacity
            let _ = payload.extend_from_slice(&self.buffer[1..len]);
            let frame = Frame {
                opcode: self.buffer[0],
                payload,
            };
            self.reset();
            return Ok(Some(frame));
        }

        Ok(None)
    }

    fn track_run(&mut self, byte: u8) {
        if byte == TERMINATOR {
            self.terminator_run += 1;
        } else {
            self.terminator_run = 0;
        }
    }
}
