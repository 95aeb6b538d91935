//! Receive side of the bit channel.
//!
//! Samples the medium for start pulses, reconstructs bytes from the pulse
//! train, and assembles sentinel-delimited frames while undoing byte
//! stuffing. The assembler is the `{listening, framing-byte}` state machine:
//! an escape byte is discarded and the byte after it is taken literally, so
//! an escaped sentinel never terminates a frame.

use tokio::time::sleep;
use tracing::trace;

use crate::config::LinkConfig;
use crate::medium::{Medium, ParticipantId};
use crate::{ESCAPE_BYTE, HEADER_SIZE, SENTINEL_BYTE};

/// Accumulates unstuffed frame bytes until the sentinel terminator.
///
/// Accumulation is bounded: bytes past `capacity` are discarded, which leaves
/// a truncated buffer that fails checksum verification at the sentinel rather
/// than growing without limit.
#[derive(Debug)]
pub struct FrameAssembler {
    buf: Vec<u8>,
    escaped: bool,
    capacity: usize,
}

impl FrameAssembler {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::new(),
            escaped: false,
            capacity,
        }
    }

    /// Feed one received byte; returns the completed frame buffer when the
    /// terminating sentinel arrives.
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
        if self.escaped {
            self.escaped = false;
            self.append(byte);
            return None;
        }

        match byte {
            SENTINEL_BYTE => {
                self.escaped = false;
                Some(std::mem::take(&mut self.buf))
            }
            ESCAPE_BYTE => {
                self.escaped = true;
                None
            }
            other => {
                self.append(other);
                None
            }
        }
    }

    fn append(&mut self, byte: u8) {
        if self.buf.len() < self.capacity {
            self.buf.push(byte);
        }
    }
}

/// Samples one participant's view of the medium.
pub struct PulseReceiver<M> {
    medium: M,
    id: ParticipantId,
    config: LinkConfig,
}

impl<M: Medium> PulseReceiver<M> {
    pub fn new(medium: M, id: ParticipantId, config: LinkConfig) -> Self {
        Self { medium, id, config }
    }

    /// Block until one sentinel-delimited frame has been reconstructed.
    ///
    /// The returned buffer is the raw frame (header + payload) with stuffing
    /// removed; the caller verifies its checksum.
    pub async fn receive_frame(&self) -> Vec<u8> {
        let mut assembler = FrameAssembler::new(self.config.max_payload + HEADER_SIZE);
        loop {
            let byte = self.receive_byte().await;
            if let Some(frame) = assembler.push(byte) {
                trace!(id = self.id, len = frame.len(), "frame assembled");
                return frame;
            }
        }
    }

    /// Sample one byte: wait for the start pulse, sleep to the midpoint of
    /// the first data pulse, then read 8 pulses most-significant bit first.
    async fn receive_byte(&self) -> u8 {
        let width = self.config.pulse_width;
        let threshold = self.config.threshold();

        while self.medium.get_level(self.id) < threshold {
            sleep(width / 10).await;
        }

        sleep(width + width / 2).await;

        let mut value: u8 = 0;
        for _ in 0..8 {
            value <<= 1;
            if self.medium.get_level(self.id) > threshold {
                value |= 1;
            }
            sleep(width).await;
        }

        value
    }
}
