//! Inkpost query cache.
//!
//! Query results are kept in an in-process [`QueryStore`], one slot per
//! [`QueryKey`]. Writes publish [`EventKind`]s to the [`EventQueue`]; the
//! [`CacheConsumer`] turns them into a [`ConsumptionPlan`] and marks the
//! affected entries stale so the next read refetches from the store.
//! Reads that were already fetching when an entry was invalidated do not
//! cache their result (see [`Generation`]).
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! post_limit = 500
//! comment_list_limit = 200
//! profile_limit = 500
//! consume_batch_limit = 100
//! ```

mod config;
mod consumer;
mod events;
mod keys;
mod lock;
pub mod metrics;
mod planner;
mod store;
mod trigger;

pub use config::CacheConfig;
pub use consumer::CacheConsumer;
pub use events::{CacheEvent, Epoch, EventKind, EventQueue};
pub use keys::{EntityKey, QueryKey};
pub use planner::ConsumptionPlan;
pub use store::{Generation, QueryStore};
pub use trigger::CacheTrigger;

use std::sync::Arc;

/// Store, queue, consumer and trigger wired together from one config.
#[derive(Clone)]
pub struct CacheHandles {
    pub store: Arc<QueryStore>,
    pub trigger: Arc<CacheTrigger>,
}

impl CacheHandles {
    /// Returns `None` when caching is disabled, so services read straight from the store.
    pub fn build(config: CacheConfig) -> Option<Self> {
        if !config.is_enabled() {
            return None;
        }

        let store = Arc::new(QueryStore::new(&config));
        let queue = Arc::new(EventQueue::new());
        let consumer = Arc::new(CacheConsumer::new(
            config.clone(),
            store.clone(),
            queue.clone(),
        ));
        let trigger = Arc::new(CacheTrigger::new(config, queue, consumer));

        Some(Self { store, trigger })
    }
}
