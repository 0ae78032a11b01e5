//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{
    AnalyticsSnapshot, CommentWithAuthor, PostListing, PostRecord, ProfileRecord,
};
use crate::domain::types::UserRole;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("store access policy refused the write")]
    Forbidden,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// The identity a write is performed as; checked by the store's access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Actor {
    /// Whether the actor may modify a resource owned by `owner_id`.
    pub fn may_modify(&self, owner_id: Uuid) -> bool {
        self.role.is_admin() || self.user_id == owner_id
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub author_id: Uuid,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
}

/// Partial update; `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct CreateProfileParams {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProfileParams {
    pub id: Uuid,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// All posts with author and comment count, newest first.
    async fn list_posts(&self) -> Result<Vec<PostListing>, RepoError>;

    async fn find_post(&self, id: Uuid) -> Result<Option<PostListing>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(
        &self,
        actor: Actor,
        params: UpdatePostParams,
    ) -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, actor: Actor, id: Uuid) -> Result<(), RepoError>;

    async fn increment_views(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments on a post with their authors, oldest first.
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError>;
}

#[async_trait]
pub trait CommentsWriteRepo: Send + Sync {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentWithAuthor, RepoError>;
}

#[async_trait]
pub trait ProfilesRepo: Send + Sync {
    async fn find_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, RepoError>;
}

#[async_trait]
pub trait ProfilesWriteRepo: Send + Sync {
    async fn create_profile(&self, params: CreateProfileParams)
    -> Result<ProfileRecord, RepoError>;

    async fn update_profile(
        &self,
        actor: Actor,
        params: UpdateProfileParams,
    ) -> Result<ProfileRecord, RepoError>;
}

#[async_trait]
pub trait AnalyticsRepo: Send + Sync {
    async fn snapshot(&self) -> Result<AnalyticsSnapshot, RepoError>;
}

/// Liveness check for the backing store.
#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
