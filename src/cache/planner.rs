//! Consumption plan generation.
//!
//! Merges a batch of cache events into the set of entries to invalidate.

use std::collections::HashSet;
use std::fmt;

use super::events::{CacheEvent, Epoch, EventKind};
use super::keys::{EntityKey, QueryKey};

#[derive(Debug, Default)]
pub struct ConsumptionPlan {
    /// Entities to mark stale.
    pub invalidate_entities: HashSet<EntityKey>,
    /// Number of distinct events merged into this plan.
    pub event_count: usize,
    /// Highest epoch seen, if any.
    pub latest_epoch: Option<Epoch>,
}

impl fmt::Display for ConsumptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConsumptionPlan {{ events: {}, invalidate: {}, latest_epoch: {:?} }}",
            self.event_count,
            self.invalidate_entities.len(),
            self.latest_epoch,
        )
    }
}

impl ConsumptionPlan {
    /// Merge events into a plan, skipping repeated event ids.
    ///
    /// Invalidation is idempotent, so the plan is the union of every
    /// event's targets; no event can cancel another's.
    pub fn from_events(events: Vec<CacheEvent>) -> Self {
        let mut plan = Self::default();
        let mut seen_ids = HashSet::new();

        for event in events {
            if !seen_ids.insert(event.id) {
                continue;
            }
            plan.event_count += 1;
            plan.latest_epoch = plan.latest_epoch.max(Some(event.epoch));
            plan.invalidate_entities
                .extend(invalidation_targets(&event.kind));
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.invalidate_entities.is_empty()
    }
}

/// The entries one event makes out of date.
pub fn invalidation_targets(kind: &EventKind) -> Vec<EntityKey> {
    use QueryKey::{Analytics, Comments, Post, PostList, Profile};

    match *kind {
        EventKind::PostCreated { post_id } => {
            vec![PostList.into(), Post(post_id).into(), Analytics.into()]
        }
        EventKind::PostUpdated { post_id } => vec![PostList.into(), Post(post_id).into()],
        EventKind::PostViewed { post_id } => {
            vec![PostList.into(), Post(post_id).into(), Analytics.into()]
        }
        EventKind::PostDeleted { post_id } => vec![
            PostList.into(),
            Post(post_id).into(),
            Comments(post_id).into(),
            Analytics.into(),
        ],
        EventKind::CommentCreated { post_id } => vec![
            Comments(post_id).into(),
            PostList.into(),
            Post(post_id).into(),
            Analytics.into(),
        ],
        EventKind::ProfileCreated { user_id } => vec![Profile(user_id).into(), Analytics.into()],
        EventKind::ProfileUpdated { user_id } => vec![
            Profile(user_id).into(),
            PostList.into(),
            EntityKey::AllPosts,
            EntityKey::AllComments,
        ],
    }
}
