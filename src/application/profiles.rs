//! Profile queries and commands.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{
    CreateProfileParams, ProfilesRepo, ProfilesWriteRepo, UpdateProfileParams,
};
use crate::application::session::{Session, Subject};
use crate::application::views::UserView;
use crate::cache::{CacheHandles, CacheTrigger, QueryKey, QueryStore};
use crate::domain::posts::{ensure_email, ensure_non_blank};
use crate::domain::types::UserRole;

/// Registers the profile for an identity the gateway already authenticated.
#[derive(Debug, Clone)]
pub struct CreateProfileCommand {
    /// Must match the registering subject when present.
    pub id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProfileCommand {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Clone)]
pub struct ProfileService {
    reader: Arc<dyn ProfilesRepo>,
    writer: Arc<dyn ProfilesWriteRepo>,
    cache: Option<Arc<QueryStore>>,
    cache_trigger: Option<Arc<CacheTrigger>>,
}

impl ProfileService {
    pub fn new(reader: Arc<dyn ProfilesRepo>, writer: Arc<dyn ProfilesWriteRepo>) -> Self {
        Self {
            reader,
            writer,
            cache: None,
            cache_trigger: None,
        }
    }

    pub fn with_cache_opt(mut self, cache: Option<CacheHandles>) -> Self {
        self.cache = cache.as_ref().map(|handles| handles.store.clone());
        self.cache_trigger = cache.map(|handles| handles.trigger);
        self
    }

    pub async fn get_profile(&self, id: Uuid) -> Result<UserView, AppError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get_profile(id) {
                return Ok(cached);
            }
            let seen = cache.generation(&QueryKey::Profile(id));
            let profile = self.load_profile(id).await?;
            cache.set_profile(profile.clone(), seen);
            Ok(profile)
        } else {
            self.load_profile(id).await
        }
    }

    /// Register the profile of `subject`. New profiles always start with the `user` role.
    pub async fn create_profile(
        &self,
        subject: &Subject,
        command: CreateProfileCommand,
    ) -> Result<UserView, AppError> {
        if command.id.is_some_and(|id| id != subject.user_id()) {
            warn!(
                target = "application::profiles::create_profile",
                subject = %subject.user_id(),
                requested = ?command.id,
                "profile registration for another subject refused"
            );
            return Err(AppError::Unauthenticated);
        }
        ensure_non_blank(&command.name, "name")?;
        ensure_email(&command.email)?;

        let params = CreateProfileParams {
            id: subject.user_id(),
            name: command.name.trim().to_string(),
            email: command.email.trim().to_string(),
            role: UserRole::User,
            bio: trimmed_non_empty(command.bio),
            avatar_url: trimmed_non_empty(command.avatar_url),
        };
        let profile = self.writer.create_profile(params).await?;
        info!(
            target = "application::profiles::create_profile",
            user_id = %profile.id,
            "profile created"
        );

        if let Some(trigger) = &self.cache_trigger {
            trigger.profile_created(profile.id);
        }

        Ok(UserView::from(profile))
    }

    /// Name, bio and avatar are mutable by the owner or an admin.
    pub async fn update_profile(
        &self,
        session: &Session,
        id: Uuid,
        command: UpdateProfileCommand,
    ) -> Result<UserView, AppError> {
        let actor = session.actor()?;
        if let Some(name) = &command.name {
            ensure_non_blank(name, "name")?;
        }

        let params = UpdateProfileParams {
            id,
            name: command.name.map(|name| name.trim().to_string()),
            bio: command.bio.map(|bio| bio.trim().to_string()),
            avatar_url: command.avatar_url.map(|url| url.trim().to_string()),
        };
        let profile = self.writer.update_profile(actor, params).await?;
        info!(
            target = "application::profiles::update_profile",
            user_id = %profile.id,
            actor_id = %actor.user_id,
            "profile updated"
        );

        if let Some(trigger) = &self.cache_trigger {
            trigger.profile_updated(profile.id);
        }

        Ok(UserView::from(profile))
    }

    async fn load_profile(&self, id: Uuid) -> Result<UserView, AppError> {
        self.reader
            .find_profile(id)
            .await?
            .map(UserView::from)
            .ok_or(AppError::NotFound)
    }
}

fn trimmed_non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
