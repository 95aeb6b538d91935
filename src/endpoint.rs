//! Stop-and-Wait ARQ engine.
//!
//! An [`Endpoint`] attaches to a shared medium and runs two long-lived tasks:
//! a transmit loop draining the outbound queue and a receive loop assembling
//! frames off the wire. They communicate only through bounded queues and a
//! small shared-state struct ([`LinkShared`]).
//!
//! # Stop-and-Wait contract
//! - At most **one** data frame is outstanding per direction at a time.
//! - A fresh data frame is stamped with the current sequence bit at dequeue;
//!   retransmissions reuse the bit and the payload unchanged.
//! - On ack: toggle the sequence bit, move to the next queued frame.
//! - On timeout: re-encode and retransmit, forever unless a retry ceiling is
//!   configured.
//! - Every valid, addressed data frame is acknowledged, duplicates included,
//!   since a duplicate means the previous ack was lost.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{broadcast, mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::checksum;
use crate::config::LinkConfig;
use crate::errors::{LinkError, Result};
use crate::events::{self, LinkEvent};
use crate::frame::Frame;
use crate::medium::{Medium, ParticipantId};
use crate::metrics::{LinkMetrics, MetricsSnapshot};
use crate::receiver::PulseReceiver;
use crate::transmitter::PulseTransmitter;

/// Protocol state shared between the two loops.
///
/// The sequence bit is written by the transmit loop only; the ack flag is
/// set by the receive loop and cleared/read by the transmit loop.
struct LinkShared {
    sequence: AtomicU8,
    ack_flag: AtomicBool,
    ack_notify: Notify,
}

/// One attached endpoint: the upper layer's handle to the link.
pub struct Endpoint {
    id: ParticipantId,
    outbound: mpsc::Sender<Frame>,
    inbound: mpsc::Receiver<Frame>,
    shared: Arc<LinkShared>,
    metrics: Arc<LinkMetrics>,
    events: broadcast::Sender<LinkEvent>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Endpoint {
    /// Attach to `medium` as participant `id` and start both control loops.
    pub fn attach<M>(id: ParticipantId, medium: M, config: LinkConfig) -> Self
    where
        M: Medium + Clone + 'static,
    {
        let (out_tx, out_rx) = mpsc::channel(config.queue_capacity);
        let (in_tx, in_rx) = mpsc::channel(config.queue_capacity);

        let shared = Arc::new(LinkShared {
            sequence: AtomicU8::new(0),
            ack_flag: AtomicBool::new(false),
            ack_notify: Notify::new(),
        });
        let metrics = Arc::new(LinkMetrics::default());
        let events = events::channel();
        let cancel = CancellationToken::new();

        let tx_side = TransmitSide {
            id,
            transmitter: PulseTransmitter::new(medium.clone(), id, config.clone()),
            out_rx,
            shared: Arc::clone(&shared),
            config: config.clone(),
            metrics: Arc::clone(&metrics),
            events: events.clone(),
            cancel: cancel.clone(),
        };
        let rx_side = ReceiveSide {
            id,
            receiver: PulseReceiver::new(medium, id, config),
            in_tx,
            out_tx: out_tx.clone(),
            shared: Arc::clone(&shared),
            metrics: Arc::clone(&metrics),
            events: events.clone(),
            cancel: cancel.clone(),
        };

        let tasks = vec![
            tokio::spawn(transmit_loop(tx_side)),
            tokio::spawn(receive_loop(rx_side)),
        ];

        Self {
            id,
            outbound: out_tx,
            inbound: in_rx,
            shared,
            metrics,
            events,
            cancel,
            tasks,
        }
    }

    /// Enqueue a payload for reliable delivery to `destination`.
    ///
    /// Blocks while the outbound queue is full and returns once queued, not
    /// once delivered.
    ///
    /// # Errors
    /// [`LinkError::PayloadTooLarge`] for oversized payloads,
    /// [`LinkError::LinkClosed`] after shutdown.
    pub async fn send(&self, payload: impl Into<Bytes>, destination: ParticipantId) -> Result<()> {
        let frame = Frame::data(payload, destination)?;
        self.outbound
            .send(frame)
            .await
            .map_err(|_| LinkError::LinkClosed)
    }

    /// Block until a delivered, validated, in-sequence frame is available.
    pub async fn receive_frame(&mut self) -> Result<Frame> {
        self.inbound.recv().await.ok_or(LinkError::LinkClosed)
    }

    /// Like [`Endpoint::receive_frame`], returning just the payload.
    pub async fn receive(&mut self) -> Result<Bytes> {
        Ok(self.receive_frame().await?.payload)
    }

    /// This endpoint's participant identifier.
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Sequence bit that the next fresh data frame will carry.
    pub fn sequence_bit(&self) -> u8 {
        self.shared.sequence.load(Ordering::Acquire)
    }

    /// Subscribe to the endpoint's structured protocol events.
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the link counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stop both control loops and wait for them to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum AckWait {
    Acked,
    TimedOut,
    Cancelled,
}

struct TransmitSide<M> {
    id: ParticipantId,
    transmitter: PulseTransmitter<M>,
    out_rx: mpsc::Receiver<Frame>,
    shared: Arc<LinkShared>,
    config: LinkConfig,
    metrics: Arc<LinkMetrics>,
    events: broadcast::Sender<LinkEvent>,
    cancel: CancellationToken,
}

async fn transmit_loop<M: Medium>(mut side: TransmitSide<M>) {
    loop {
        let frame = tokio::select! {
            _ = side.cancel.cancelled() => break,
            frame = side.out_rx.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };
        if !side.transmit(frame).await {
            break;
        }
    }
    side.transmitter.release();
    debug!(id = side.id, "transmit loop stopped");
}

impl<M: Medium> TransmitSide<M> {
    /// Transmit one dequeued frame to completion (through retransmissions for
    /// data frames). Returns false when cancelled.
    async fn transmit(&mut self, mut frame: Frame) -> bool {
        frame.source = self.id;
        if !frame.is_ack {
            frame.sequence = self.shared.sequence.load(Ordering::Acquire);
        }

        let mut attempt: u32 = 0;
        loop {
            // Checksum is recomputed for every attempt.
            let wire = frame.encode();
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                _ = self.transmitter.transmit_frame(&wire) => {}
            }
            events::emit(
                &self.events,
                LinkEvent::FrameSent {
                    destination: frame.destination,
                    sequence: frame.sequence,
                    is_ack: frame.is_ack,
                    attempt,
                },
            );

            if frame.is_ack {
                // Acks are fire-and-forget.
                LinkMetrics::incr(&self.metrics.acks_sent);
                debug!(id = self.id, dest = frame.destination, "ack sent");
                return true;
            }
            LinkMetrics::incr(&self.metrics.data_frames_sent);

            self.shared.ack_flag.store(false, Ordering::Release);
            match self.wait_for_ack().await {
                AckWait::Acked => {
                    // Advance the alternating bit for the next fresh frame.
                    self.shared.sequence.fetch_xor(1, Ordering::AcqRel);
                    events::emit(
                        &self.events,
                        LinkEvent::FrameAcknowledged {
                            destination: frame.destination,
                            sequence: frame.sequence,
                            attempt,
                        },
                    );
                    debug!(
                        id = self.id,
                        dest = frame.destination,
                        seq = frame.sequence,
                        attempt,
                        "frame acknowledged"
                    );
                    return true;
                }
                AckWait::TimedOut => {
                    events::emit(
                        &self.events,
                        LinkEvent::AckTimeout {
                            destination: frame.destination,
                            sequence: frame.sequence,
                            attempt,
                        },
                    );
                    warn!(
                        id = self.id,
                        dest = frame.destination,
                        seq = frame.sequence,
                        attempt,
                        "ack timeout, retransmitting"
                    );
                    if let Some(max) = self.config.max_retries {
                        if attempt >= max {
                            events::emit(
                                &self.events,
                                LinkEvent::RetriesExhausted {
                                    destination: frame.destination,
                                    sequence: frame.sequence,
                                },
                            );
                            warn!(
                                id = self.id,
                                dest = frame.destination,
                                "retry ceiling reached, abandoning frame"
                            );
                            return true;
                        }
                    }
                    LinkMetrics::incr(&self.metrics.retransmissions);
                    attempt += 1;
                }
                AckWait::Cancelled => return false,
            }
        }
    }

    async fn wait_for_ack(&self) -> AckWait {
        let deadline = Instant::now() + self.config.ack_timeout();
        loop {
            if self.shared.ack_flag.load(Ordering::Acquire) {
                return AckWait::Acked;
            }
            let notified = self.shared.ack_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            // Re-check: the ack may have landed before we registered.
            if self.shared.ack_flag.load(Ordering::Acquire) {
                return AckWait::Acked;
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return AckWait::Cancelled,
                _ = notified => {}
                _ = sleep_until(deadline) => return AckWait::TimedOut,
            }
        }
    }
}

struct ReceiveSide<M> {
    id: ParticipantId,
    receiver: PulseReceiver<M>,
    in_tx: mpsc::Sender<Frame>,
    out_tx: mpsc::Sender<Frame>,
    shared: Arc<LinkShared>,
    metrics: Arc<LinkMetrics>,
    events: broadcast::Sender<LinkEvent>,
    cancel: CancellationToken,
}

async fn receive_loop<M: Medium>(side: ReceiveSide<M>) {
    // Last delivered sequence bit per source; a repeat means the ack for the
    // previous delivery was lost.
    let mut last_delivered: HashMap<ParticipantId, u8> = HashMap::new();

    loop {
        let raw = tokio::select! {
            _ = side.cancel.cancelled() => break,
            raw = side.receiver.receive_frame() => raw,
        };

        if !checksum::verify(&raw) {
            LinkMetrics::incr(&side.metrics.checksum_drops);
            events::emit(&side.events, LinkEvent::FrameDroppedChecksum { len: raw.len() });
            debug!(id = side.id, len = raw.len(), "checksum mismatch, frame dropped");
            continue;
        }

        let frame = match Frame::decode(&raw) {
            Ok(frame) => frame,
            Err(_) => {
                events::emit(&side.events, LinkEvent::FrameDroppedMalformed { len: raw.len() });
                debug!(id = side.id, len = raw.len(), "malformed buffer dropped");
                continue;
            }
        };

        if frame.destination != side.id {
            LinkMetrics::incr(&side.metrics.misaddressed_drops);
            events::emit(
                &side.events,
                LinkEvent::FrameDroppedMisaddressed {
                    destination: frame.destination,
                },
            );
            continue;
        }

        if frame.is_ack {
            side.shared.ack_flag.store(true, Ordering::Release);
            side.shared.ack_notify.notify_waiters();
            LinkMetrics::incr(&side.metrics.acks_received);
            events::emit(&side.events, LinkEvent::AckReceived { source: frame.source });
            debug!(id = side.id, source = frame.source, "ack received");
            continue;
        }

        let source = frame.source;
        let sequence = frame.sequence;
        if last_delivered.get(&source) == Some(&sequence) {
            LinkMetrics::incr(&side.metrics.duplicates_suppressed);
            events::emit(&side.events, LinkEvent::DuplicateSuppressed { source, sequence });
            debug!(id = side.id, source, sequence, "duplicate suppressed");
        } else {
            let len = frame.payload_len();
            let delivered = tokio::select! {
                _ = side.cancel.cancelled() => break,
                result = side.in_tx.send(frame) => result,
            };
            if delivered.is_err() {
                break;
            }
            last_delivered.insert(source, sequence);
            LinkMetrics::incr(&side.metrics.frames_delivered);
            events::emit(&side.events, LinkEvent::FrameDelivered { source, sequence, len });
        }

        // A replacement ack follows every valid, addressed data frame,
        // duplicate or not.
        let queued = tokio::select! {
            _ = side.cancel.cancelled() => break,
            result = side.out_tx.send(Frame::ack(source)) => result,
        };
        if queued.is_err() {
            break;
        }
    }
    debug!(id = side.id, "receive loop stopped");
}
