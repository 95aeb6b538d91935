/// PulseLink Core - Stop-and-Wait data link over a shared analog line
///
/// This library implements the data-link layer for two endpoints attached to
/// an inherently unreliable, shared, bit-serial physical channel: framing and
/// byte stuffing of payloads into a self-delimiting pulse train, a 16-bit
/// one's-complement checksum, and a Stop-and-Wait ARQ engine providing
/// at-least-once, in-order, duplicate-free delivery.
///
/// # Design Principles
/// - One frame in flight per direction, unbounded retransmission by default
/// - Transmit and receive loops run as independent tasks sharing explicit state
/// - Link-level faults (corruption, loss, duplication) never reach the caller
/// - Pulse timing is injectable so both ends agree on the line's cadence
pub mod checksum;
pub mod config;
pub mod endpoint;
pub mod errors;
pub mod events;
pub mod frame;
pub mod medium;
pub mod metrics;
pub mod receiver;
pub mod transmitter;

pub use config::LinkConfig;
pub use endpoint::Endpoint;
pub use errors::{LinkError, Result};
pub use events::LinkEvent;
pub use frame::Frame;
pub use medium::{Medium, SharedWire, LEVEL_IDLE};

/// Sentinel byte terminating every frame on the wire.
pub const SENTINEL_BYTE: u8 = 0x7E;

/// Escape byte preceding any sentinel- or escape-valued content byte.
pub const ESCAPE_BYTE: u8 = 0x7D;

/// Fixed wire header size in bytes.
pub const HEADER_SIZE: usize = 6;

/// Maximum payload size (in bytes) per frame.
pub const MAX_PAYLOAD_SIZE: usize = 1500;

/// Capacity of the outbound and inbound frame queues.
pub const QUEUE_CAPACITY: usize = 5;
