use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{
    Actor, CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::{PostListing, PostRecord};

use super::PostgresRepositories;
use super::types::{AUTHOR_COLUMNS, POST_COLUMNS, PostListingRow, PostRow};
use super::util::map_sqlx_error;

fn listing_query(filter: &str) -> String {
    format!(
        "SELECT p.id, p.title, p.content, p.excerpt, p.author_id, p.tags, p.image_url, \
         p.views, p.created_at, p.updated_at, {AUTHOR_COLUMNS}, \
         (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count \
         FROM blog_posts p \
         INNER JOIN profiles a ON a.id = p.author_id \
         {filter}"
    )
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(&self) -> Result<Vec<PostListing>, RepoError> {
        let sql = listing_query("ORDER BY p.created_at DESC, p.id DESC");
        let rows = sqlx::query_as::<_, PostListingRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(PostListingRow::into_listing).collect()
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostListing>, RepoError> {
        let sql = listing_query("WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostListingRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(PostListingRow::into_listing).transpose()
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            title,
            content,
            excerpt,
            author_id,
            tags,
            image_url,
        } = params;

        let sql = format!(
            "INSERT INTO blog_posts (id, title, content, excerpt, author_id, tags, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(title)
            .bind(content)
            .bind(excerpt)
            .bind(author_id)
            .bind(tags)
            .bind(image_url)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_post(
        &self,
        actor: Actor,
        params: UpdatePostParams,
    ) -> Result<PostRecord, RepoError> {
        let UpdatePostParams {
            id,
            title,
            content,
            excerpt,
            tags,
            image_url,
        } = params;

        let sql = format!(
            "UPDATE blog_posts SET \
                title = COALESCE($2, title), \
                content = COALESCE($3, content), \
                excerpt = COALESCE($4, excerpt), \
                tags = COALESCE($5, tags), \
                image_url = CASE WHEN $6::TEXT IS NULL THEN image_url \
                                 ELSE NULLIF($6, '') END, \
                updated_at = now() \
             WHERE id = $1 AND (author_id = $7 OR $8) \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(title)
            .bind(content)
            .bind(excerpt)
            .bind(tags)
            .bind(image_url)
            .bind(actor.user_id)
            .bind(actor.role.is_admin())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(self.explain_refused_write("blog_posts", id, actor).await),
        }
    }

    async fn delete_post(&self, actor: Actor, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query(
            "DELETE FROM blog_posts WHERE id = $1 AND (author_id = $2 OR $3)",
        )
        .bind(id)
        .bind(actor.user_id)
        .bind(actor.role.is_admin())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(self.explain_refused_write("blog_posts", id, actor).await);
        }
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE blog_posts SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
