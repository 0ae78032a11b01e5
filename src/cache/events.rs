//! Cache event system.
//!
//! Write paths publish an [`EventKind`] after the store confirmed the write.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::gauge;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::lock::Recover;
use super::metrics::CACHE_QUEUE_LEN;

const SOURCE: &str = "cache::events";

/// Monotonic, process-local event sequence number.
pub type Epoch = u64;

#[derive(Debug, Clone)]
pub struct CacheEvent {
    /// Idempotency key.
    pub id: Uuid,
    pub epoch: Epoch,
    pub kind: EventKind,
    pub timestamp: OffsetDateTime,
}

impl CacheEvent {
    pub fn new(kind: EventKind, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Mutations that make cached query results out of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PostCreated { post_id: Uuid },
    PostUpdated { post_id: Uuid },
    PostDeleted { post_id: Uuid },
    /// The view counter moved; content is unchanged.
    PostViewed { post_id: Uuid },
    CommentCreated { post_id: Uuid },
    ProfileCreated { user_id: Uuid },
    /// Author names and avatars are embedded in post and comment views.
    ProfileUpdated { user_id: Uuid },
}

/// In-memory FIFO of pending cache events.
pub struct EventQueue {
    queue: Mutex<VecDeque<CacheEvent>>,
    epoch_counter: AtomicU64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            epoch_counter: AtomicU64::new(0),
        }
    }

    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn publish(&self, kind: EventKind) {
        let epoch = self.next_epoch();
        let event = CacheEvent::new(kind, epoch);

        info!(
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = ?kind,
            "Cache event enqueued"
        );

        let mut queue = self.queue.lock().recover(SOURCE, "publish");
        queue.push_back(event);
        gauge!(CACHE_QUEUE_LEN).set(queue.len() as f64);
    }

    /// Drain up to `limit` events in FIFO order.
    pub fn drain(&self, limit: usize) -> Vec<CacheEvent> {
        let mut queue = self.queue.lock().recover(SOURCE, "drain");
        let count = limit.min(queue.len());
        let drained: Vec<CacheEvent> = queue.drain(..count).collect();
        gauge!(CACHE_QUEUE_LEN).set(queue.len() as f64);
        drained
    }

    pub fn len(&self) -> usize {
        self.queue.lock().recover(SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
