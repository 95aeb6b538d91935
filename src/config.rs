//! Link configuration.
//!
//! The reference configuration mirrors the line card this protocol was built
//! for: 200 ms pulses at ±2.5, a 1500-byte MTU, and queue capacity 5. Both
//! ends of a link must agree on the timing values: the protocol is
//! time-synchronous and the receiver's sampling offsets are derived from the
//! same pulse width the transmitter paces with.

use std::time::Duration;

use crate::{HEADER_SIZE, MAX_PAYLOAD_SIZE, QUEUE_CAPACITY};

/// Tunable parameters for one endpoint.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Width of one signal pulse.
    pub pulse_width: Duration,

    /// Level driven for a 1 bit and for the start pulse.
    pub high_level: f64,

    /// Level driven for a 0 bit and for inter-byte holds.
    pub low_level: f64,

    /// Maximum payload size accepted per frame.
    pub max_payload: usize,

    /// Capacity of the outbound and inbound queues.
    pub queue_capacity: usize,

    /// Payload size assumed by the acknowledgment timeout formula.
    pub nominal_payload: usize,

    /// Slack added to the acknowledgment timeout to cover the ack's own
    /// flight time and receiver processing.
    pub ack_margin: Duration,

    /// Retransmission ceiling; `None` retries forever (the baseline policy).
    pub max_retries: Option<u32>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            pulse_width: Duration::from_millis(200),
            high_level: 2.5,
            low_level: -2.5,
            max_payload: MAX_PAYLOAD_SIZE,
            queue_capacity: QUEUE_CAPACITY,
            nominal_payload: 8,
            ack_margin: Duration::from_secs(6),
            max_retries: None,
        }
    }
}

impl LinkConfig {
    /// Create the reference configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pulse width.
    pub fn with_pulse_width(mut self, width: Duration) -> Self {
        self.pulse_width = width;
        self
    }

    /// Set the high/low drive levels.
    pub fn with_levels(mut self, high: f64, low: f64) -> Self {
        self.high_level = high;
        self.low_level = low;
        self
    }

    /// Set the retransmission ceiling.
    pub fn with_max_retries(mut self, retries: Option<u32>) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the acknowledgment timeout margin.
    pub fn with_ack_margin(mut self, margin: Duration) -> Self {
        self.ack_margin = margin;
        self
    }

    /// Detection threshold for bit sampling: `(low + 2 * high) / 3`.
    pub fn threshold(&self) -> f64 {
        (self.low_level + 2.0 * self.high_level) / 3.0
    }

    /// How long the transmit loop waits for an acknowledgment before
    /// retransmitting: `8 * frame_bits * pulse_width + margin`, with the
    /// frame size taken as header plus [`Self::nominal_payload`].
    pub fn ack_timeout(&self) -> Duration {
        let frame_bytes = (HEADER_SIZE + self.nominal_payload) as u32;
        self.pulse_width * (8 * frame_bytes) + self.ack_margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_threshold() {
        let config = LinkConfig::default();
        let expected = (-2.5 + 2.0 * 2.5) / 3.0;
        assert!((config.threshold() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reference_ack_timeout() {
        // 8 * (6 + 8) * 200ms + 6s = 28.4s.
        let config = LinkConfig::default();
        assert_eq!(config.ack_timeout(), Duration::from_millis(28_400));
    }

    #[test]
    fn test_builder_chaining() {
        let config = LinkConfig::new()
            .with_pulse_width(Duration::from_millis(10))
            .with_levels(5.0, -5.0)
            .with_max_retries(Some(3));

        assert_eq!(config.pulse_width, Duration::from_millis(10));
        assert_eq!(config.high_level, 5.0);
        assert_eq!(config.max_retries, Some(3));
    }
}
