use async_trait::async_trait;

use crate::application::repos::{AnalyticsRepo, RepoError};
use crate::domain::entities::AnalyticsSnapshot;

use super::PostgresRepositories;
use super::types::AnalyticsRow;
use super::util::map_sqlx_error;

#[async_trait]
impl AnalyticsRepo for PostgresRepositories {
    async fn snapshot(&self) -> Result<AnalyticsSnapshot, RepoError> {
        let row = sqlx::query_as::<_, AnalyticsRow>(
            "SELECT \
                (SELECT COUNT(*) FROM blog_posts) AS total_posts, \
                (SELECT COUNT(*) FROM comments) AS total_comments, \
                (SELECT COUNT(*) FROM profiles) AS total_users, \
                (SELECT COALESCE(SUM(views), 0)::BIGINT FROM blog_posts) AS total_views",
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(AnalyticsSnapshot {
            total_posts: Self::convert_count(row.total_posts)?,
            total_comments: Self::convert_count(row.total_comments)?,
            total_users: Self::convert_count(row.total_users)?,
            total_views: Self::convert_count(row.total_views)?,
        })
    }
}
