//! Structured observability events.
//!
//! The protocol loops report what happened on the link through a broadcast
//! channel instead of printing: tests (and operators) subscribe and assert on
//! the exact sequence of drops, timeouts and suppressions.

use tokio::sync::broadcast;

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// One observable protocol action at an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A frame finished transmitting. `attempt` is 0 for the first
    /// transmission and counts retransmissions after that.
    FrameSent {
        destination: u8,
        sequence: u8,
        is_ack: bool,
        attempt: u32,
    },

    /// The in-flight data frame was acknowledged and the sequence bit
    /// advanced; the transmit loop moves on.
    FrameAcknowledged {
        destination: u8,
        sequence: u8,
        attempt: u32,
    },

    /// A validated, in-sequence data frame was handed to the inbound queue.
    FrameDelivered {
        source: u8,
        sequence: u8,
        len: usize,
    },

    /// A received buffer failed checksum verification and was dropped.
    FrameDroppedChecksum { len: usize },

    /// A valid frame addressed to another endpoint was dropped.
    FrameDroppedMisaddressed { destination: u8 },

    /// A checksum-valid buffer was too short to carry a frame header.
    FrameDroppedMalformed { len: usize },

    /// An acknowledgment addressed to this endpoint arrived.
    AckReceived { source: u8 },

    /// The acknowledgment wait elapsed; the frame will be retransmitted
    /// unless the retry ceiling is exhausted.
    AckTimeout {
        destination: u8,
        sequence: u8,
        attempt: u32,
    },

    /// A duplicate data frame was suppressed (its ack is still re-sent).
    DuplicateSuppressed { source: u8, sequence: u8 },

    /// The configured retry ceiling was reached; the frame was abandoned.
    RetriesExhausted { destination: u8, sequence: u8 },
}

/// Create the endpoint's event channel.
pub(crate) fn channel() -> broadcast::Sender<LinkEvent> {
    broadcast::channel(EVENT_CHANNEL_CAPACITY).0
}

/// Emit an event, ignoring the no-subscriber case.
pub(crate) fn emit(sender: &broadcast::Sender<LinkEvent>, event: LinkEvent) {
    let _ = sender.send(event);
}
