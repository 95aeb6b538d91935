//! Cumulative link counters.
//!
//! Cheap atomic counters incremented by the protocol loops; `snapshot` gives
//! a consistent-enough view for tests and operational polling.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the two control loops and the endpoint handle.
#[derive(Debug, Default)]
pub struct LinkMetrics {
    /// Data frames transmitted, including retransmissions.
    pub data_frames_sent: AtomicU64,

    /// Acknowledgment frames transmitted.
    pub acks_sent: AtomicU64,

    /// Retransmissions triggered by acknowledgment timeouts.
    pub retransmissions: AtomicU64,

    /// Acknowledgments received and applied.
    pub acks_received: AtomicU64,

    /// Data frames delivered to the inbound queue.
    pub frames_delivered: AtomicU64,

    /// Buffers dropped on checksum mismatch.
    pub checksum_drops: AtomicU64,

    /// Frames dropped because they were addressed elsewhere.
    pub misaddressed_drops: AtomicU64,

    /// Duplicate data frames suppressed.
    pub duplicates_suppressed: AtomicU64,
}

/// Point-in-time copy of [`LinkMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub data_frames_sent: u64,
    pub acks_sent: u64,
    pub retransmissions: u64,
    pub acks_received: u64,
    pub frames_delivered: u64,
    pub checksum_drops: u64,
    pub misaddressed_drops: u64,
    pub duplicates_suppressed: u64,
}

impl LinkMetrics {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            data_frames_sent: self.data_frames_sent.load(Ordering::Relaxed),
            acks_sent: self.acks_sent.load(Ordering::Relaxed),
            retransmissions: self.retransmissions.load(Ordering::Relaxed),
            acks_received: self.acks_received.load(Ordering::Relaxed),
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            checksum_drops: self.checksum_drops.load(Ordering::Relaxed),
            misaddressed_drops: self.misaddressed_drops.load(Ordering::Relaxed),
            duplicates_suppressed: self.duplicates_suppressed.load(Ordering::Relaxed),
        }
    }
}
