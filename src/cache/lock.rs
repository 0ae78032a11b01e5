//! Poison-tolerant access to the cache's std locks.
//!
//! Cached values are derived data; after a panic elsewhere the worst case is
//! a stale read, so a poisoned guard is taken over and the event logged.

use std::sync::LockResult;

use tracing::warn;

pub(crate) trait Recover<G> {
    /// Unwrap the guard, taking over a poisoned lock.
    fn recover(self, source: &'static str, op: &'static str) -> G;
}

impl<G> Recover<G> for LockResult<G> {
    fn recover(self, source: &'static str, op: &'static str) -> G {
        self.unwrap_or_else(|poisoned| {
            warn!(
                source,
                op,
                result = "poisoned_recovered",
                "Recovered from poisoned cache lock"
            );
            poisoned.into_inner()
        })
    }
}
