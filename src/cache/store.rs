//! Query result storage.
//!
//! Every entry carries a `stale` flag. Invalidation only marks entries
//! stale; a stale entry reads as a miss and is replaced by the next `set_*`.
//!
//! Each kind of entry also counts invalidations in a [`Generation`]. Readers
//! take the generation before fetching from the store and pass it back to
//! `set_*`; a fill started before an invalidation of that kind is dropped, so
//! an in-flight read cannot put pre-write data back as a fresh entry.

use std::num::NonZeroUsize;
use std::sync::RwLock;

use lru::LruCache;
use metrics::counter;
use tracing::debug;
use uuid::Uuid;

use crate::application::views::{AnalyticsView, BlogPostView, CommentView, UserView};

use super::config::CacheConfig;
use super::keys::{EntityKey, QueryKey};
use super::lock::Recover;
use super::metrics::{CACHE_FILL_REJECTED, CACHE_HIT, CACHE_INVALIDATE, CACHE_MISS};

const SOURCE: &str = "cache::store";

/// Invalidation count of one entry kind, observed before a store fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    stale: bool,
}

impl<T: Clone> Entry<T> {
    fn fresh(value: T) -> Self {
        Self {
            value,
            stale: false,
        }
    }

    fn read(&self) -> Option<T> {
        (!self.stale).then(|| self.value.clone())
    }

    fn mark(&mut self) -> usize {
        if self.stale {
            return 0;
        }
        self.stale = true;
        1
    }
}

/// A single cached result.
struct Slot<T> {
    entry: Option<Entry<T>>,
    generation: u64,
}

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        Self {
            entry: None,
            generation: 0,
        }
    }

    fn read(&self) -> Option<T> {
        self.entry.as_ref().and_then(Entry::read)
    }

    fn fill(&mut self, value: T, seen: Generation) -> bool {
        if seen.0 != self.generation {
            return false;
        }
        self.entry = Some(Entry::fresh(value));
        true
    }

    fn invalidate(&mut self) -> usize {
        self.generation += 1;
        self.entry.as_mut().map_or(0, Entry::mark)
    }

    fn is_fresh(&self) -> bool {
        self.entry.as_ref().is_some_and(|entry| !entry.stale)
    }
}

/// LRU-bounded results keyed by id, sharing one generation.
struct Keyed<T> {
    entries: LruCache<Uuid, Entry<T>>,
    generation: u64,
}

impl<T: Clone> Keyed<T> {
    fn new(limit: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(limit),
            generation: 0,
        }
    }

    fn read(&mut self, id: &Uuid) -> Option<T> {
        self.entries.get(id).and_then(Entry::read)
    }

    fn fill(&mut self, id: Uuid, value: T, seen: Generation) -> bool {
        if seen.0 != self.generation {
            return false;
        }
        self.entries.put(id, Entry::fresh(value));
        true
    }

    fn invalidate_one(&mut self, id: &Uuid) -> usize {
        self.generation += 1;
        self.entries.peek_mut(id).map_or(0, Entry::mark)
    }

    fn invalidate_all(&mut self) -> usize {
        self.generation += 1;
        self.entries
            .iter_mut()
            .map(|(_, entry)| entry.mark())
            .sum()
    }

    fn is_fresh(&self, id: &Uuid) -> bool {
        self.entries.peek(id).is_some_and(|entry| !entry.stale)
    }

    fn clear(&mut self) {
        self.generation += 1;
        self.entries.clear();
    }
}

/// In-memory query cache with per-kind LRU bounds.
pub struct QueryStore {
    post_list: RwLock<Slot<Vec<BlogPostView>>>,
    analytics: RwLock<Slot<AnalyticsView>>,
    posts: RwLock<Keyed<BlogPostView>>,
    comments: RwLock<Keyed<Vec<CommentView>>>,
    profiles: RwLock<Keyed<UserView>>,
}

impl QueryStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            post_list: RwLock::new(Slot::new()),
            analytics: RwLock::new(Slot::new()),
            posts: RwLock::new(Keyed::new(config.post_limit_non_zero())),
            comments: RwLock::new(Keyed::new(config.comment_list_limit_non_zero())),
            profiles: RwLock::new(Keyed::new(config.profile_limit_non_zero())),
        }
    }

    /// Take before fetching `key` from the store; hand it back to the matching `set_*`.
    pub fn generation(&self, key: &QueryKey) -> Generation {
        const OP: &str = "generation";
        let current = match key {
            QueryKey::PostList => self.post_list.read().recover(SOURCE, OP).generation,
            QueryKey::Analytics => self.analytics.read().recover(SOURCE, OP).generation,
            QueryKey::Post(_) => self.posts.read().recover(SOURCE, OP).generation,
            QueryKey::Comments(_) => self.comments.read().recover(SOURCE, OP).generation,
            QueryKey::Profile(_) => self.profiles.read().recover(SOURCE, OP).generation,
        };
        Generation(current)
    }

    // ========================================================================
    // Singletons
    // ========================================================================

    pub fn get_post_list(&self) -> Option<Vec<BlogPostView>> {
        let value = self.post_list.read().recover(SOURCE, "get_post_list").read();
        record_lookup(QueryKey::PostList, value.is_some());
        value
    }

    /// Returns false when the list was invalidated after `seen` was taken.
    pub fn set_post_list(&self, posts: Vec<BlogPostView>, seen: Generation) -> bool {
        let stored = self
            .post_list
            .write()
            .recover(SOURCE, "set_post_list")
            .fill(posts, seen);
        record_fill(QueryKey::PostList, stored)
    }

    pub fn get_analytics(&self) -> Option<AnalyticsView> {
        let value = self.analytics.read().recover(SOURCE, "get_analytics").read();
        record_lookup(QueryKey::Analytics, value.is_some());
        value
    }

    pub fn set_analytics(&self, analytics: AnalyticsView, seen: Generation) -> bool {
        let stored = self
            .analytics
            .write()
            .recover(SOURCE, "set_analytics")
            .fill(analytics, seen);
        record_fill(QueryKey::Analytics, stored)
    }

    // ========================================================================
    // Keyed entries
    // ========================================================================

    pub fn get_post(&self, id: Uuid) -> Option<BlogPostView> {
        let value = self.posts.write().recover(SOURCE, "get_post").read(&id);
        record_lookup(QueryKey::Post(id), value.is_some());
        value
    }

    pub fn set_post(&self, post: BlogPostView, seen: Generation) -> bool {
        let key = QueryKey::Post(post.id);
        let stored = self
            .posts
            .write()
            .recover(SOURCE, "set_post")
            .fill(post.id, post, seen);
        record_fill(key, stored)
    }

    pub fn get_comments(&self, post_id: Uuid) -> Option<Vec<CommentView>> {
        let value = self
            .comments
            .write()
            .recover(SOURCE, "get_comments")
            .read(&post_id);
        record_lookup(QueryKey::Comments(post_id), value.is_some());
        value
    }

    pub fn set_comments(&self, post_id: Uuid, comments: Vec<CommentView>, seen: Generation) -> bool {
        let stored = self
            .comments
            .write()
            .recover(SOURCE, "set_comments")
            .fill(post_id, comments, seen);
        record_fill(QueryKey::Comments(post_id), stored)
    }

    pub fn get_profile(&self, id: Uuid) -> Option<UserView> {
        let value = self.profiles.write().recover(SOURCE, "get_profile").read(&id);
        record_lookup(QueryKey::Profile(id), value.is_some());
        value
    }

    pub fn set_profile(&self, profile: UserView, seen: Generation) -> bool {
        let key = QueryKey::Profile(profile.id);
        let stored = self
            .profiles
            .write()
            .recover(SOURCE, "set_profile")
            .fill(profile.id, profile, seen);
        record_fill(key, stored)
    }

    // ========================================================================
    // Invalidation
    // ========================================================================

    /// Mark every entry covered by `entity` stale and advance its generation.
    /// Returns how many entries changed.
    pub fn invalidate(&self, entity: &EntityKey) -> usize {
        let marked = match entity {
            EntityKey::Query(QueryKey::PostList) => self
                .post_list
                .write()
                .recover(SOURCE, "invalidate.post_list")
                .invalidate(),
            EntityKey::Query(QueryKey::Analytics) => self
                .analytics
                .write()
                .recover(SOURCE, "invalidate.analytics")
                .invalidate(),
            EntityKey::Query(QueryKey::Post(id)) => self
                .posts
                .write()
                .recover(SOURCE, "invalidate.post")
                .invalidate_one(id),
            EntityKey::Query(QueryKey::Comments(id)) => self
                .comments
                .write()
                .recover(SOURCE, "invalidate.comments")
                .invalidate_one(id),
            EntityKey::Query(QueryKey::Profile(id)) => self
                .profiles
                .write()
                .recover(SOURCE, "invalidate.profile")
                .invalidate_one(id),
            EntityKey::AllPosts => self
                .posts
                .write()
                .recover(SOURCE, "invalidate.all_posts")
                .invalidate_all(),
            EntityKey::AllComments => self
                .comments
                .write()
                .recover(SOURCE, "invalidate.all_comments")
                .invalidate_all(),
        };

        if marked > 0 {
            counter!(CACHE_INVALIDATE, "target" => entity_label(entity))
                .increment(marked as u64);
        }
        marked
    }

    /// Whether `key` currently holds a fresh value. Does not touch LRU order or metrics.
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        const OP: &str = "is_fresh";
        match key {
            QueryKey::PostList => self.post_list.read().recover(SOURCE, OP).is_fresh(),
            QueryKey::Analytics => self.analytics.read().recover(SOURCE, OP).is_fresh(),
            QueryKey::Post(id) => self.posts.read().recover(SOURCE, OP).is_fresh(id),
            QueryKey::Comments(id) => self.comments.read().recover(SOURCE, OP).is_fresh(id),
            QueryKey::Profile(id) => self.profiles.read().recover(SOURCE, OP).is_fresh(id),
        }
    }

    /// Drop every entry. Fills already in flight are refused.
    pub fn clear(&self) {
        {
            let mut slot = self.post_list.write().recover(SOURCE, "clear.post_list");
            slot.invalidate();
            slot.entry = None;
        }
        {
            let mut slot = self.analytics.write().recover(SOURCE, "clear.analytics");
            slot.invalidate();
            slot.entry = None;
        }
        self.posts.write().recover(SOURCE, "clear.posts").clear();
        self.comments.write().recover(SOURCE, "clear.comments").clear();
        self.profiles.write().recover(SOURCE, "clear.profiles").clear();
    }
}

fn record_lookup(key: QueryKey, hit: bool) {
    let name = if hit { CACHE_HIT } else { CACHE_MISS };
    counter!(name, "kind" => key.kind()).increment(1);
}

fn record_fill(key: QueryKey, stored: bool) -> bool {
    if !stored {
        debug!(%key, "Cache fill dropped: invalidated while fetching");
        counter!(CACHE_FILL_REJECTED, "kind" => key.kind()).increment(1);
    }
    stored
}

fn entity_label(entity: &EntityKey) -> &'static str {
    match entity {
        EntityKey::Query(key) => key.kind(),
        EntityKey::AllPosts => "all_posts",
        EntityKey::AllComments => "all_comments",
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use time::OffsetDateTime;

    use super::*;
    use crate::domain::types::UserRole;

    fn user(id: Uuid) -> UserView {
        UserView {
            id,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: UserRole::User,
            bio: String::new(),
            avatar_url: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn post(id: Uuid) -> BlogPostView {
        BlogPostView {
            id,
            title: "Hello".to_string(),
            content: "Body".to_string(),
            excerpt: "Body".to_string(),
            author: user(Uuid::new_v4()),
            tags: vec!["rust".to_string()],
            image_url: None,
            views: 0,
            comments_count: 0,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn fill_post(store: &QueryStore, post: BlogPostView) -> bool {
        let seen = store.generation(&QueryKey::Post(post.id));
        store.set_post(post, seen)
    }

    #[test]
    fn miss_then_hit() {
        let store = QueryStore::new(&CacheConfig::default());
        let id = Uuid::new_v4();

        assert!(store.get_post(id).is_none());
        assert!(fill_post(&store, post(id)));
        assert_eq!(store.get_post(id).map(|p| p.id), Some(id));
    }

    #[test]
    fn invalidated_entry_reads_as_miss_until_replaced() {
        let store = QueryStore::new(&CacheConfig::default());
        let seen = store.generation(&QueryKey::PostList);
        store.set_post_list(vec![post(Uuid::new_v4())], seen);

        assert_eq!(
            store.invalidate(&EntityKey::Query(QueryKey::PostList)),
            1
        );
        assert!(store.get_post_list().is_none());
        assert!(!store.is_fresh(&QueryKey::PostList));

        let seen = store.generation(&QueryKey::PostList);
        assert!(store.set_post_list(Vec::new(), seen));
        assert_eq!(store.get_post_list().map(|posts| posts.len()), Some(0));
    }

    #[test]
    fn fill_started_before_invalidation_is_dropped() {
        let store = QueryStore::new(&CacheConfig::default());
        let seen = store.generation(&QueryKey::PostList);

        // Nothing cached yet; the invalidation still counts.
        assert_eq!(store.invalidate(&EntityKey::Query(QueryKey::PostList)), 0);

        assert!(!store.set_post_list(vec![post(Uuid::new_v4())], seen));
        assert!(store.get_post_list().is_none());
    }

    #[test]
    fn wildcard_invalidation_refuses_pending_keyed_fills() {
        let store = QueryStore::new(&CacheConfig::default());
        let post_id = Uuid::new_v4();
        let seen = store.generation(&QueryKey::Comments(post_id));

        store.invalidate(&EntityKey::AllComments);

        assert!(!store.set_comments(post_id, Vec::new(), seen));
        assert!(!store.is_fresh(&QueryKey::Comments(post_id)));
    }

    #[test]
    fn other_kinds_keep_their_generation() {
        let store = QueryStore::new(&CacheConfig::default());
        let id = Uuid::new_v4();
        let seen = store.generation(&QueryKey::Profile(id));

        store.invalidate(&EntityKey::Query(QueryKey::Analytics));
        store.invalidate(&EntityKey::AllPosts);

        assert_eq!(store.generation(&QueryKey::Profile(id)), seen);
        assert!(store.set_profile(user(id), seen));
    }

    #[test]
    fn invalidating_twice_marks_once() {
        let store = QueryStore::new(&CacheConfig::default());
        let id = Uuid::new_v4();
        store.set_profile(user(id), store.generation(&QueryKey::Profile(id)));

        let key = EntityKey::Query(QueryKey::Profile(id));
        assert_eq!(store.invalidate(&key), 1);
        assert_eq!(store.invalidate(&key), 0);
    }

    #[test]
    fn invalidating_absent_entry_is_a_no_op() {
        let store = QueryStore::new(&CacheConfig::default());
        assert_eq!(
            store.invalidate(&EntityKey::Query(QueryKey::Comments(Uuid::new_v4()))),
            0
        );
        assert_eq!(store.invalidate(&EntityKey::AllPosts), 0);
    }

    #[test]
    fn wildcard_marks_every_entry_of_its_kind() {
        let store = QueryStore::new(&CacheConfig::default());
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        fill_post(&store, post(first));
        fill_post(&store, post(second));
        store.set_comments(
            first,
            Vec::new(),
            store.generation(&QueryKey::Comments(first)),
        );

        assert_eq!(store.invalidate(&EntityKey::AllPosts), 2);
        assert!(!store.is_fresh(&QueryKey::Post(first)));
        assert!(!store.is_fresh(&QueryKey::Post(second)));
        assert!(store.is_fresh(&QueryKey::Comments(first)));
    }

    #[test]
    fn lru_evicts_oldest_entry() {
        let config = CacheConfig {
            profile_limit: 2,
            ..Default::default()
        };
        let store = QueryStore::new(&config);
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            store.set_profile(user(*id), store.generation(&QueryKey::Profile(*id)));
        }

        assert!(store.get_profile(ids[0]).is_none());
        assert!(store.get_profile(ids[1]).is_some());
        assert!(store.get_profile(ids[2]).is_some());
    }

    #[test]
    fn clear_drops_everything() {
        let store = QueryStore::new(&CacheConfig::default());
        let id = Uuid::new_v4();
        fill_post(&store, post(id));
        let pending = store.generation(&QueryKey::Analytics);
        store.set_analytics(AnalyticsView::default(), pending);

        store.clear();

        assert!(store.get_post(id).is_none());
        assert!(store.get_analytics().is_none());
        assert!(!store.set_analytics(AnalyticsView::default(), pending));
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let store = QueryStore::new(&CacheConfig::default());

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store
                .analytics
                .write()
                .expect("analytics lock should be acquired");
            panic!("poison analytics lock");
        }));

        let seen = store.generation(&QueryKey::Analytics);
        store.set_analytics(AnalyticsView::default(), seen);
        assert!(store.get_analytics().is_some());
    }
}
