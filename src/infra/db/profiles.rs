use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{
    Actor, CreateProfileParams, ProfilesRepo, ProfilesWriteRepo, RepoError, UpdateProfileParams,
};
use crate::domain::entities::ProfileRecord;

use super::PostgresRepositories;
use super::types::{PROFILE_COLUMNS, ProfileRow};
use super::util::map_sqlx_error;

#[async_trait]
impl ProfilesRepo for PostgresRepositories {
    async fn find_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, RepoError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ProfileRecord::from))
    }
}

#[async_trait]
impl ProfilesWriteRepo for PostgresRepositories {
    async fn create_profile(
        &self,
        params: CreateProfileParams,
    ) -> Result<ProfileRecord, RepoError> {
        let sql = format!(
            "INSERT INTO profiles (id, name, email, role, bio, avatar_url) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PROFILE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(params.id)
            .bind(params.name)
            .bind(params.email)
            .bind(params.role)
            .bind(params.bio)
            .bind(params.avatar_url)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_profile(
        &self,
        actor: Actor,
        params: UpdateProfileParams,
    ) -> Result<ProfileRecord, RepoError> {
        let UpdateProfileParams {
            id,
            name,
            bio,
            avatar_url,
        } = params;

        let sql = format!(
            "UPDATE profiles SET \
                name = COALESCE($2, name), \
                bio = CASE WHEN $3::TEXT IS NULL THEN bio ELSE NULLIF($3, '') END, \
                avatar_url = CASE WHEN $4::TEXT IS NULL THEN avatar_url \
                                  ELSE NULLIF($4, '') END \
             WHERE id = $1 AND (id = $5 OR $6) \
             RETURNING {PROFILE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(id)
            .bind(name)
            .bind(bio)
            .bind(avatar_url)
            .bind(actor.user_id)
            .bind(actor.role.is_admin())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(self.explain_refused_write("profiles", id, actor).await),
        }
    }
}
