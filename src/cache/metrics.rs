//! Metric names emitted by the query cache.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};

/// Lookups answered from a fresh entry, labelled by `kind`.
pub const CACHE_HIT: &str = "inkpost_cache_hit_total";
/// Lookups that found nothing or a stale entry, labelled by `kind`.
pub const CACHE_MISS: &str = "inkpost_cache_miss_total";
/// Entries marked stale, labelled by invalidation `target`.
pub const CACHE_INVALIDATE: &str = "inkpost_cache_invalidate_total";
/// Fills dropped because the entry was invalidated mid-fetch, labelled by `kind`.
pub const CACHE_FILL_REJECTED: &str = "inkpost_cache_fill_rejected_total";
pub const CACHE_QUEUE_LEN: &str = "inkpost_cache_event_queue_len";
pub const CACHE_CONSUME_MS: &str = "inkpost_cache_consume_ms";

static DESCRIBED: Once = Once::new();

/// Register units and descriptions with the installed recorder. Idempotent.
pub fn describe() {
    DESCRIBED.call_once(|| {
        for (name, help) in [
            (CACHE_HIT, "Query cache lookups served from a fresh entry."),
            (CACHE_MISS, "Query cache lookups that fell through to the store."),
            (CACHE_INVALIDATE, "Query cache entries marked stale by mutation events."),
            (
                CACHE_FILL_REJECTED,
                "Store results not cached because a write invalidated them in flight.",
            ),
        ] {
            describe_counter!(name, Unit::Count, help);
        }
        describe_gauge!(
            CACHE_QUEUE_LEN,
            Unit::Count,
            "Mutation events waiting to be consumed."
        );
        describe_histogram!(
            CACHE_CONSUME_MS,
            Unit::Milliseconds,
            "Time spent turning a batch of events into invalidations."
        );
    });
}
