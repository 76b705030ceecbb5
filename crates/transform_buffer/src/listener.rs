//! TransformListener - delivery queue between publishers and the buffer.
//!
//! Publishers enqueue messages without touching the buffer. The listener
//! drains the queue either from a background task (`run`) or on the waiting
//! thread (`spin_once`, the `EventPump` hook).

use std::sync::{Arc, Mutex, PoisonError};

use contracts::{EventPump, StampedTransform, TransformError};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::TransformBuffer;

/// Authority recorded for messages delivered through the listener
const AUTHORITY: &str = "transform_listener";

/// One delivered message
#[derive(Debug, Clone, PartialEq)]
pub enum TransformMessage {
    Dynamic(StampedTransform),
    Static(StampedTransform),
}

impl TransformMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            TransformMessage::Dynamic(_) => "dynamic",
            TransformMessage::Static(_) => "static",
        }
    }
}

/// Sending half, cloneable
#[derive(Debug, Clone)]
pub struct TransformPublisher {
    tx: mpsc::UnboundedSender<TransformMessage>,
}

impl TransformPublisher {
    /// Enqueue a dynamic transform. Returns `false` once the listener is gone.
    pub fn publish(&self, tf: StampedTransform) -> bool {
        self.tx.send(TransformMessage::Dynamic(tf)).is_ok()
    }

    /// Enqueue a static transform. Returns `false` once the listener is gone.
    pub fn publish_static(&self, tf: StampedTransform) -> bool {
        self.tx.send(TransformMessage::Static(tf)).is_ok()
    }
}

/// Receiving half, owns delivery into the buffer
#[derive(Debug)]
pub struct TransformListener {
    buffer: Arc<TransformBuffer>,
    rx: Mutex<mpsc::UnboundedReceiver<TransformMessage>>,
}

impl TransformListener {
    pub fn new(buffer: Arc<TransformBuffer>) -> (Self, TransformPublisher) {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = Self {
            buffer,
            rx: Mutex::new(rx),
        };
        (listener, TransformPublisher { tx })
    }

    #[inline]
    pub fn buffer(&self) -> &Arc<TransformBuffer> {
        &self.buffer
    }

    /// Deliver everything currently queued, without waiting. Returns the
    /// number of messages handled.
    pub fn drain_pending(&self) -> usize {
        let mut rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner);
        let mut handled = 0;
        while let Ok(message) = rx.try_recv() {
            self.deliver(message);
            handled += 1;
        }
        handled
    }

    /// Deliver until every publisher is dropped
    #[instrument(level = "debug", name = "transform_listener_run", skip(self))]
    pub async fn run(self) {
        let Self { buffer, rx } = self;
        let mut rx = rx.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut delivered: u64 = 0;

        while let Some(message) = rx.recv().await {
            deliver_to(&buffer, message);
            delivered += 1;

            if delivered % 100 == 0 {
                let stats = buffer.stats();
                observability::record_buffer_stats(stats.frame_count, stats.total_samples);
            }
        }

        debug!(delivered, "All publishers dropped, listener stopped");
    }

    fn deliver(&self, message: TransformMessage) {
        deliver_to(&self.buffer, message);
    }
}

impl EventPump for TransformListener {
    fn spin_once(&self) {
        self.drain_pending();
    }
}

fn deliver_to(buffer: &TransformBuffer, message: TransformMessage) {
    let kind = message.kind();
    observability::record_transform_received(kind);

    let result = match message {
        TransformMessage::Dynamic(tf) => buffer.set_transform(tf, AUTHORITY),
        TransformMessage::Static(tf) => buffer.set_static_transform(tf, AUTHORITY),
    };

    if let Err(e) = result {
        observability::record_transform_rejected(rejection_reason(&e));
        warn!(kind, error = %e, "Transform rejected");
    }
}

fn rejection_reason(e: &TransformError) -> &'static str {
    match e {
        TransformError::StaleData { .. } => "stale",
        TransformError::InvalidTransform { .. } => "invalid",
        _ => "other",
    }
}
