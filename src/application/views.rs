//! JSON view models shaped from joined store rows.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{
    AnalyticsSnapshot, CommentWithAuthor, PostListing, ProfileRecord,
};
use crate::domain::types::UserRole;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Empty when the profile has no bio.
    pub bio: String,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<ProfileRecord> for UserView {
    fn from(profile: ProfileRecord) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            role: profile.role,
            bio: profile.bio.unwrap_or_default(),
            avatar_url: profile.avatar_url,
            created_at: profile.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPostView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub author: UserView,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub views: i64,
    pub comments_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<PostListing> for BlogPostView {
    fn from(listing: PostListing) -> Self {
        let PostListing {
            post,
            author,
            comment_count,
        } = listing;
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            excerpt: post.excerpt,
            author: author.into(),
            tags: post.tags,
            image_url: post.image_url,
            views: post.views.max(0),
            comments_count: comment_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub author: UserView,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<CommentWithAuthor> for CommentView {
    fn from(value: CommentWithAuthor) -> Self {
        Self {
            id: value.comment.id,
            post_id: value.comment.post_id,
            content: value.comment.content,
            author: value.author.into(),
            created_at: value.comment.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalyticsView {
    pub total_posts: u64,
    pub total_comments: u64,
    pub total_users: u64,
    pub total_views: u64,
}

impl From<AnalyticsSnapshot> for AnalyticsView {
    fn from(snapshot: AnalyticsSnapshot) -> Self {
        Self {
            total_posts: snapshot.total_posts,
            total_comments: snapshot.total_comments,
            total_users: snapshot.total_users,
            total_views: snapshot.total_views,
        }
    }
}
