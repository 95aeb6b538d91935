//! Frame model and wire codec.
//!
//! Wire layout (fixed 6-byte header, network byte order):
//!
//! ```text
//! [destination(1)][source(1)][checksum_hi(1)][checksum_lo(1)][ack(1)][sequence(1)][payload…]
//! ```
//!
//! The checksum covers `[destination][source][ack][sequence] + payload` and is
//! spliced into bytes 2–3 at encode time. Decoding reads the other fields at
//! their fixed offsets; the checksum bytes are consumed only by
//! [`crate::checksum::verify`] over the whole buffer, which the receive loop
//! runs before decoding.

use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum;
use crate::errors::{LinkError, Result};
use crate::{HEADER_SIZE, MAX_PAYLOAD_SIZE};

/// The protocol message unit: header fields plus payload.
///
/// `source` and (for data frames) `sequence` are stamped by the transmit loop,
/// not by the caller. A frame has no identity beyond a single transmission
/// attempt; retransmissions re-encode the same in-memory value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Endpoint the frame is addressed to; 0 is the unset/broadcast slot.
    pub destination: u8,

    /// Sending endpoint, stamped by the transmitting engine.
    pub source: u8,

    /// True for acknowledgment frames, which carry no payload.
    pub is_ack: bool,

    /// Alternating bit (0 or 1) for data frames; ignored for acks.
    pub sequence: u8,

    /// Payload bytes, at most [`MAX_PAYLOAD_SIZE`].
    pub payload: Bytes,
}

impl Frame {
    /// Create a data frame bound for `destination`.
    ///
    /// # Errors
    /// Returns [`LinkError::PayloadTooLarge`] if the payload exceeds the MTU.
    pub fn data(payload: impl Into<Bytes>, destination: u8) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(LinkError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Self {
            destination,
            source: 0,
            is_ack: false,
            sequence: 0,
            payload,
        })
    }

    /// Create an empty acknowledgment frame bound for `destination`.
    pub fn ack(destination: u8) -> Self {
        Self {
            destination,
            source: 0,
            is_ack: true,
            sequence: 0,
            payload: Bytes::new(),
        }
    }

    /// Serialize to wire bytes, computing a fresh checksum.
    ///
    /// Called for every transmission attempt so the checksum is never carried
    /// over from a previous hop or attempt.
    pub fn encode(&self) -> Bytes {
        let ack_byte = u8::from(self.is_ack);

        // Checksum region: header without the checksum field, then payload.
        let mut summed = Vec::with_capacity(4 + self.payload.len());
        summed.extend_from_slice(&[self.destination, self.source, ack_byte, self.sequence]);
        summed.extend_from_slice(&self.payload);
        let sum = checksum::compute(&summed);

        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.payload.len());
        buf.put_u8(self.destination);
        buf.put_u8(self.source);
        buf.put_u16(sum);
        buf.put_u8(ack_byte);
        buf.put_u8(self.sequence);
        buf.extend_from_slice(&self.payload);
        buf.freeze()
    }

    /// Deserialize from a raw received buffer.
    ///
    /// Does not verify the checksum; the receive loop verifies the whole
    /// buffer first and discards on mismatch.
    ///
    /// # Errors
    /// Returns [`LinkError::TruncatedFrame`] for buffers shorter than the
    /// fixed header.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < HEADER_SIZE {
            return Err(LinkError::TruncatedFrame { len: raw.len() });
        }

        Ok(Self {
            destination: raw[0],
            source: raw[1],
            is_ack: raw[4] == 1,
            sequence: raw[5],
            payload: Bytes::copy_from_slice(&raw[HEADER_SIZE..]),
        })
    }

    /// Payload length in bytes.
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}
