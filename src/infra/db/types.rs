//! Row shapes returned by the queries in this module, and their domain mappings.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{
    CommentRecord, CommentWithAuthor, PostListing, PostRecord, ProfileRecord,
};
use crate::domain::types::UserRole;

pub(super) const PROFILE_COLUMNS: &str =
    "id, name, email, role, bio, avatar_url, created_at";

pub(super) const POST_COLUMNS: &str =
    "id, title, content, excerpt, author_id, tags, image_url, views, created_at, updated_at";

/// Author columns joined as `a`, prefixed so they don't collide with the owning row.
pub(super) const AUTHOR_COLUMNS: &str = "a.name AS author_name, a.email AS author_email, \
     a.role AS author_role, a.bio AS author_bio, a.avatar_url AS author_avatar_url, \
     a.created_at AS author_created_at";

#[derive(sqlx::FromRow)]
pub(super) struct ProfileRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<ProfileRow> for ProfileRecord {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            bio: row.bio,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct PostRow {
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

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            excerpt: row.excerpt,
            author_id: row.author_id,
            tags: row.tags,
            image_url: row.image_url,
            views: row.views,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct AuthorColumns {
    pub author_name: String,
    pub author_email: String,
    pub author_role: UserRole,
    pub author_bio: Option<String>,
    pub author_avatar_url: Option<String>,
    pub author_created_at: OffsetDateTime,
}

impl AuthorColumns {
    fn into_profile(self, id: Uuid) -> ProfileRecord {
        ProfileRecord {
            id,
            name: self.author_name,
            email: self.author_email,
            role: self.author_role,
            bio: self.author_bio,
            avatar_url: self.author_avatar_url,
            created_at: self.author_created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct PostListingRow {
    #[sqlx(flatten)]
    pub post: PostRow,
    #[sqlx(flatten)]
    pub author: AuthorColumns,
    pub comment_count: i64,
}

impl PostListingRow {
    pub fn into_listing(self) -> Result<PostListing, crate::application::repos::RepoError> {
        let comment_count = super::PostgresRepositories::convert_count(self.comment_count)?;
        let author = self.author.into_profile(self.post.author_id);
        Ok(PostListing {
            post: self.post.into(),
            author,
            comment_count,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: OffsetDateTime,
    #[sqlx(flatten)]
    pub author: AuthorColumns,
}

impl From<CommentRow> for CommentWithAuthor {
    fn from(row: CommentRow) -> Self {
        let author = row.author.into_profile(row.author_id);
        Self {
            comment: CommentRecord {
                id: row.id,
                post_id: row.post_id,
                author_id: row.author_id,
                content: row.content,
                created_at: row.created_at,
            },
            author,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct AnalyticsRow {
    pub total_posts: i64,
    pub total_comments: i64,
    pub total_users: i64,
    pub total_views: i64,
}
