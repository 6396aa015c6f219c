//! Diagnostics seam for the controller
//!
//! The controller never logs on its own; hosts that want visibility into
//! protocol recovery and page routing inject an observer. Every method
//! defaults to a no-op.

use crate::transport::SendError;

/// Observer for controller-internal events
pub trait LinkObserver {
    /// A stalled partial message was abandoned after the framing timeout
    fn timeout_recovered(&mut self, _now_ms: u64) {}

    /// The receive buffer overflowed and the in-flight message was lost
    fn frame_overflow(&mut self) {}

    /// A complete frame was dropped (unknown opcode or short payload)
    fn frame_dropped(&mut self, _opcode: u8) {}

    /// An event referenced a page id not present in the registry
    fn unknown_page(&mut self, _page_id: u8) {}

    /// The active page changed
    fn page_switched(&mut self, _from: Option<u8>, _to: u8) {}

    /// An outbound command could not be sent
    fn send_failed(&mut self, _error: SendError) {}
}
