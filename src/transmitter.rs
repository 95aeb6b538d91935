//! Transmit side of the bit channel.
//!
//! Converts wire bytes into a timed pulse train on the medium: for every
//! stuffed byte, a low hold, a start pulse, then the 8 bits most-significant
//! first, one pulse width each. The sentinel terminator is transmitted
//! unescaped and unconditionally after the frame body.

use tokio::time::sleep;
use tracing::trace;

use crate::config::LinkConfig;
use crate::medium::{Medium, ParticipantId, LEVEL_IDLE};
use crate::{ESCAPE_BYTE, SENTINEL_BYTE};

/// Escape every sentinel- or escape-valued byte in `body`.
///
/// The returned sequence never contains a bare [`SENTINEL_BYTE`] that could
/// be mistaken for a frame terminator.
pub fn stuff(body: &[u8]) -> Vec<u8> {
    let mut stuffed = Vec::with_capacity(body.len());
    for &byte in body {
        if byte == SENTINEL_BYTE || byte == ESCAPE_BYTE {
            stuffed.push(ESCAPE_BYTE);
        }
        stuffed.push(byte);
    }
    stuffed
}

/// Drives one participant's side of the medium.
pub struct PulseTransmitter<M> {
    medium: M,
    id: ParticipantId,
    config: LinkConfig,
}

impl<M: Medium> PulseTransmitter<M> {
    pub fn new(medium: M, id: ParticipantId, config: LinkConfig) -> Self {
        Self { medium, id, config }
    }

    /// Transmit one frame's wire bytes and return the line to idle.
    ///
    /// Returns only once the full pulse train has been driven. The caller may
    /// cancel by dropping the future mid-sleep; it must then release the line
    /// itself (see [`PulseTransmitter::release`]).
    pub async fn transmit_frame(&self, wire_bytes: &[u8]) {
        trace!(id = self.id, len = wire_bytes.len(), "transmitting frame");

        // Settle the line low before the first start pulse.
        self.medium.set_level(self.id, self.config.low_level);
        sleep(self.config.pulse_width * 4).await;

        for &byte in &stuff(wire_bytes) {
            self.transmit_byte(byte).await;
        }
        self.transmit_byte(SENTINEL_BYTE).await;

        self.medium.set_level(self.id, LEVEL_IDLE);
    }

    /// Stop driving the line.
    pub fn release(&self) {
        self.medium.set_level(self.id, LEVEL_IDLE);
    }

    async fn transmit_byte(&self, value: u8) {
        let width = self.config.pulse_width;

        self.medium.set_level(self.id, self.config.low_level);
        sleep(width * 4).await;

        // Start pulse announces the byte to the sampling receiver.
        self.medium.set_level(self.id, self.config.high_level);
        sleep(width).await;

        for bit in (0..8).rev() {
            let level = if value >> bit & 1 == 1 {
                self.config.high_level
            } else {
                self.config.low_level
            };
            self.medium.set_level(self.id, level);
            sleep(width).await;
        }
    }
}
