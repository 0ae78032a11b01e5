//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::UserRole;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub author_id: Uuid,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub views: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: OffsetDateTime,
}

/// A post joined with its author and the live number of comments referencing it.
#[derive(Debug, Clone, PartialEq)]
pub struct PostListing {
    pub post: PostRecord,
    pub author: ProfileRecord,
    pub comment_count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentWithAuthor {
    pub comment: CommentRecord,
    pub author: ProfileRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalyticsSnapshot {
    pub total_posts: u64,
    pub total_comments: u64,
    pub total_users: u64,
    pub total_views: u64,
}
