/// Error types for PulseLink operations
///
/// Transient link faults (corruption, loss, duplication) are handled inside
/// the ARQ engine and never surface here; the variants below cover caller
/// mistakes, malformed wire buffers, and link shutdown.
use thiserror::Error;

/// Result type alias for PulseLink operations.
pub type Result<T> = std::result::Result<T, LinkError>;

/// PulseLink error enumeration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Payload exceeds the maximum transmission unit.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Received buffer shorter than the fixed frame header.
    #[error("truncated frame: {len} bytes is shorter than the 6-byte header")]
    TruncatedFrame { len: usize },

    /// The endpoint's control loops have been stopped.
    #[error("link closed")]
    LinkClosed,
}
