//! Cache key definitions.
//!
//! `QueryKey` names one cached query result; `EntityKey` names an
//! invalidation target, which may cover many query results.

use std::fmt;

use uuid::Uuid;

/// A cached query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// All posts, newest first.
    PostList,
    /// One post with author and comment count.
    Post(Uuid),
    /// Comments on a post, oldest first.
    Comments(Uuid),
    /// One user profile.
    Profile(Uuid),
    /// Site-wide totals.
    Analytics,
}

impl QueryKey {
    /// Stable label used in metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryKey::PostList => "post_list",
            QueryKey::Post(_) => "post",
            QueryKey::Comments(_) => "comments",
            QueryKey::Profile(_) => "profile",
            QueryKey::Analytics => "analytics",
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Post(id) | QueryKey::Comments(id) | QueryKey::Profile(id) => {
                write!(f, "{}:{id}", self.kind())
            }
            QueryKey::PostList | QueryKey::Analytics => f.write_str(self.kind()),
        }
    }
}

/// Identifies what a mutation invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    /// Exactly one cached query.
    Query(QueryKey),
    /// Every cached single-post entry.
    AllPosts,
    /// Every cached comment list.
    AllComments,
}

impl EntityKey {
    /// Whether invalidating `self` affects the cached `key`.
    pub fn covers(&self, key: &QueryKey) -> bool {
        match self {
            EntityKey::Query(own) => own == key,
            EntityKey::AllPosts => matches!(key, QueryKey::Post(_)),
            EntityKey::AllComments => matches!(key, QueryKey::Comments(_)),
        }
    }
}

impl From<QueryKey> for EntityKey {
    fn from(key: QueryKey) -> Self {
        EntityKey::Query(key)
    }
}
