use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{
    CommentsRepo, CommentsWriteRepo, CreateCommentParams, RepoError,
};
use crate::domain::entities::CommentWithAuthor;

use super::PostgresRepositories;
use super::types::{AUTHOR_COLUMNS, CommentRow};
use super::util::{map_sqlx_error, violates_foreign_key};

const POST_FOREIGN_KEY: &str = "comments_post_id_fkey";

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let sql = format!(
            "SELECT c.id, c.post_id, c.author_id, c.content, c.created_at, {AUTHOR_COLUMNS} \
             FROM comments c \
             INNER JOIN profiles a ON a.id = c.author_id \
             WHERE c.post_id = $1 \
             ORDER BY c.created_at ASC, c.id ASC"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(post_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentWithAuthor::from).collect())
    }
}

#[async_trait]
impl CommentsWriteRepo for PostgresRepositories {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentWithAuthor, RepoError> {
        let sql = format!(
            "WITH inserted AS ( \
                INSERT INTO comments (id, post_id, author_id, content) \
                VALUES ($1, $2, $3, $4) \
                RETURNING id, post_id, author_id, content, created_at \
             ) \
             SELECT c.id, c.post_id, c.author_id, c.content, c.created_at, {AUTHOR_COLUMNS} \
             FROM inserted c \
             INNER JOIN profiles a ON a.id = c.author_id"
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(params.post_id)
            .bind(params.author_id)
            .bind(params.content)
            .fetch_one(self.pool())
            .await
            .map_err(|err| {
                if violates_foreign_key(&err, POST_FOREIGN_KEY) {
                    RepoError::NotFound
                } else {
                    map_sqlx_error(err)
                }
            })?;

        Ok(row.into())
    }
}
