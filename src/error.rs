//! Error types for the wire-frame boundary.
//!
//! The matching core itself has no recoverable failures: capacity and
//! invariant violations are fatal. Frames, however, arrive from outside
//! the trust boundary, so decoding them is fallible.

use thiserror::Error;

/// Error type for inbound/outbound frame handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Buffer is too short to hold a frame at the requested offset.
    #[error("frame truncated: need {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        needed: usize,
        offset: usize,
        available: usize,
    },

    /// Side byte is neither 0 (buy) nor 1 (sell).
    #[error("unknown side byte {0:#04x}")]
    UnknownSide(u8),

    /// Status byte is neither 0 (accepted) nor 1 (filled).
    #[error("unknown execution status byte {0:#04x}")]
    UnknownStatus(u8),
}
