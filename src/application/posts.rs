//! Blog post queries and commands.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::listing::{PostQueryFilter, collect_tags};
use crate::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::application::session::Session;
use crate::application::views::BlogPostView;
use crate::cache::{CacheHandles, CacheTrigger, QueryKey, QueryStore};
use crate::domain::posts::{ensure_non_blank, normalize_tags, resolve_excerpt};

#[derive(Debug, Clone, Default)]
pub struct CreatePostCommand {
    pub title: String,
    pub content: String,
    /// Derived from the first paragraph of `content` when absent or blank.
    pub excerpt: Option<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdatePostCommand {
    pub title: Option<String>,
    pub content: Option<String>,
    /// A blank excerpt alongside new content re-derives it from that content.
    pub excerpt: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image_url: Option<String>,
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    cache: Option<Arc<QueryStore>>,
    cache_trigger: Option<Arc<CacheTrigger>>,
}

impl PostService {
    pub fn new(reader: Arc<dyn PostsRepo>, writer: Arc<dyn PostsWriteRepo>) -> Self {
        Self {
            reader,
            writer,
            cache: None,
            cache_trigger: None,
        }
    }

    /// Attach the query cache (optional).
    pub fn with_cache_opt(mut self, cache: Option<CacheHandles>) -> Self {
        self.cache = cache.as_ref().map(|handles| handles.store.clone());
        self.cache_trigger = cache.map(|handles| handles.trigger);
        self
    }

    /// All posts, newest first.
    pub async fn list_posts(&self) -> Result<Vec<BlogPostView>, AppError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get_post_list() {
                return Ok(cached);
            }
            let seen = cache.generation(&QueryKey::PostList);
            let posts = self.load_posts().await?;
            cache.set_post_list(posts.clone(), seen);
            Ok(posts)
        } else {
            self.load_posts().await
        }
    }

    /// The cached list, searched, filtered by tag and reordered.
    pub async fn search_posts(
        &self,
        filter: &PostQueryFilter,
    ) -> Result<Vec<BlogPostView>, AppError> {
        let posts = self.list_posts().await?;
        Ok(filter.apply(posts))
    }

    /// Distinct tags across all posts, sorted.
    pub async fn list_tags(&self) -> Result<Vec<String>, AppError> {
        let posts = self.list_posts().await?;
        Ok(collect_tags(&posts))
    }

    pub async fn get_post(&self, id: Uuid) -> Result<BlogPostView, AppError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get_post(id) {
                return Ok(cached);
            }
            let seen = cache.generation(&QueryKey::Post(id));
            let post = self.load_post(id).await?;
            cache.set_post(post.clone(), seen);
            Ok(post)
        } else {
            self.load_post(id).await
        }
    }

    pub async fn create_post(
        &self,
        session: &Session,
        command: CreatePostCommand,
    ) -> Result<BlogPostView, AppError> {
        let identity = session.require_authenticated()?;
        ensure_non_blank(&command.title, "title")?;
        ensure_non_blank(&command.content, "content")?;

        let excerpt = resolve_excerpt(command.excerpt.as_deref(), &command.content);
        let params = CreatePostParams {
            title: command.title.trim().to_string(),
            content: command.content,
            excerpt,
            author_id: identity.user_id,
            tags: normalize_tags(command.tags),
            image_url: normalize_optional(command.image_url),
        };

        let post = self.writer.create_post(params).await?;
        info!(
            target = "application::posts::create_post",
            post_id = %post.id,
            author_id = %post.author_id,
            "post created"
        );

        if let Some(trigger) = &self.cache_trigger {
            trigger.post_created(post.id);
        }

        self.get_post(post.id).await
    }

    pub async fn update_post(
        &self,
        session: &Session,
        id: Uuid,
        command: UpdatePostCommand,
    ) -> Result<BlogPostView, AppError> {
        let actor = session.actor()?;
        if let Some(title) = &command.title {
            ensure_non_blank(title, "title")?;
        }
        if let Some(content) = &command.content {
            ensure_non_blank(content, "content")?;
        }

        let excerpt = match (command.excerpt.as_deref(), command.content.as_deref()) {
            (Some(excerpt), Some(content)) => Some(resolve_excerpt(Some(excerpt), content)),
            (Some(excerpt), None) if !excerpt.trim().is_empty() => {
                Some(excerpt.trim().to_string())
            }
            _ => None,
        };

        let params = UpdatePostParams {
            id,
            title: command.title.map(|title| title.trim().to_string()),
            content: command.content,
            excerpt,
            tags: command.tags.map(normalize_tags),
            image_url: command.image_url.map(|url| url.trim().to_string()),
        };

        let post = self.writer.update_post(actor, params).await?;
        info!(
            target = "application::posts::update_post",
            post_id = %post.id,
            actor_id = %actor.user_id,
            "post updated"
        );

        if let Some(trigger) = &self.cache_trigger {
            trigger.post_updated(post.id);
        }

        self.get_post(post.id).await
    }

    pub async fn delete_post(&self, session: &Session, id: Uuid) -> Result<(), AppError> {
        let actor = session.actor()?;
        self.writer.delete_post(actor, id).await?;
        info!(
            target = "application::posts::delete_post",
            post_id = %id,
            actor_id = %actor.user_id,
            "post deleted"
        );

        if let Some(trigger) = &self.cache_trigger {
            trigger.post_deleted(id);
        }
        Ok(())
    }

    /// Bump the view counter. Failures are logged and never surfaced.
    pub async fn record_view(&self, id: Uuid) {
        match self.writer.increment_views(id).await {
            Ok(()) => {
                if let Some(trigger) = &self.cache_trigger {
                    trigger.post_viewed(id);
                }
            }
            Err(RepoError::NotFound) => {
                warn!(
                    target = "application::posts::record_view",
                    post_id = %id,
                    "view not recorded; post not found"
                );
            }
            Err(err) => {
                warn!(
                    target = "application::posts::record_view",
                    post_id = %id,
                    error = %err,
                    "view not recorded"
                );
            }
        }
    }

    async fn load_posts(&self) -> Result<Vec<BlogPostView>, AppError> {
        let listings = self.reader.list_posts().await?;
        Ok(listings.into_iter().map(BlogPostView::from).collect())
    }

    async fn load_post(&self, id: Uuid) -> Result<BlogPostView, AppError> {
        self.reader
            .find_post(id)
            .await?
            .map(BlogPostView::from)
            .ok_or(AppError::NotFound)
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
