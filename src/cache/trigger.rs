//! Cache trigger service.
//!
//! Write paths call the convenience methods here after the store confirmed
//! the mutation.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::config::CacheConfig;
use super::consumer::CacheConsumer;
use super::events::{EventKind, EventQueue};

pub struct CacheTrigger {
    config: CacheConfig,
    queue: Arc<EventQueue>,
    consumer: Arc<CacheConsumer>,
}

impl CacheTrigger {
    pub fn new(config: CacheConfig, queue: Arc<EventQueue>, consumer: Arc<CacheConsumer>) -> Self {
        Self {
            config,
            queue,
            consumer,
        }
    }

    /// Publish an event and optionally consume the queue right away.
    pub fn trigger(&self, kind: EventKind, consume_now: bool) {
        if !self.config.is_enabled() {
            debug!(event_kind = ?kind, "Cache trigger skipped: cache disabled");
            return;
        }

        self.queue.publish(kind);

        if consume_now {
            self.consumer.consume_all();
        }
    }

    pub fn post_created(&self, post_id: Uuid) {
        self.trigger(EventKind::PostCreated { post_id }, true);
    }

    pub fn post_updated(&self, post_id: Uuid) {
        self.trigger(EventKind::PostUpdated { post_id }, true);
    }

    pub fn post_deleted(&self, post_id: Uuid) {
        self.trigger(EventKind::PostDeleted { post_id }, true);
    }

    pub fn post_viewed(&self, post_id: Uuid) {
        self.trigger(EventKind::PostViewed { post_id }, true);
    }

    pub fn comment_created(&self, post_id: Uuid) {
        self.trigger(EventKind::CommentCreated { post_id }, true);
    }

    pub fn profile_created(&self, user_id: Uuid) {
        self.trigger(EventKind::ProfileCreated { user_id }, true);
    }

    pub fn profile_updated(&self, user_id: Uuid) {
        self.trigger(EventKind::ProfileUpdated { user_id }, true);
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    pub fn consumer(&self) -> &Arc<CacheConsumer> {
        &self.consumer
    }
}
