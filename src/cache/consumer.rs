//! Cache consumer for executing consumption plans.

use std::sync::Arc;
use std::time::Instant;

use metrics::histogram;
use tracing::{info, instrument};
use uuid::Uuid;

use super::config::CacheConfig;
use super::events::EventQueue;
use super::metrics::CACHE_CONSUME_MS;
use super::planner::ConsumptionPlan;
use super::store::QueryStore;

/// Drains the event queue and marks the planned entries stale.
pub struct CacheConsumer {
    config: CacheConfig,
    store: Arc<QueryStore>,
    queue: Arc<EventQueue>,
}

impl CacheConsumer {
    pub fn new(config: CacheConfig, store: Arc<QueryStore>, queue: Arc<EventQueue>) -> Self {
        Self {
            config,
            store,
            queue,
        }
    }

    /// Consume one batch of pending events.
    ///
    /// Returns true if any events were processed.
    #[instrument(skip(self))]
    pub fn consume(&self) -> bool {
        let started_at = Instant::now();
        let events = self.queue.drain(self.config.consume_batch_limit);
        if events.is_empty() {
            return false;
        }

        let event_count = events.len();
        let event_ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        let plan = ConsumptionPlan::from_events(events);

        info!(
            event_count,
            event_ids = ?event_ids,
            plan = %plan,
            "Cache consumption starting"
        );

        let marked: usize = plan
            .invalidate_entities
            .iter()
            .map(|entity| self.store.invalidate(entity))
            .sum();

        info!(
            event_count,
            invalidated = plan.invalidate_entities.len(),
            marked_stale = marked,
            "Cache consumption complete"
        );

        histogram!(CACHE_CONSUME_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        true
    }

    /// Consume batches until the queue is empty.
    pub fn consume_all(&self) -> usize {
        let mut batches = 0;
        while self.consume() {
            batches += 1;
        }
        batches
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    pub fn store(&self) -> &Arc<QueryStore> {
        &self.store
    }
}
