//! Comment queries and commands.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{CommentsRepo, CommentsWriteRepo, CreateCommentParams};
use crate::application::session::Session;
use crate::application::views::CommentView;
use crate::cache::{CacheHandles, CacheTrigger, QueryKey, QueryStore};
use crate::domain::posts::ensure_non_blank;

#[derive(Debug, Clone, Default)]
pub struct CreateCommentCommand {
    pub content: String,
}

#[derive(Clone)]
pub struct CommentService {
    reader: Arc<dyn CommentsRepo>,
    writer: Arc<dyn CommentsWriteRepo>,
    cache: Option<Arc<QueryStore>>,
    cache_trigger: Option<Arc<CacheTrigger>>,
}

impl CommentService {
    pub fn new(reader: Arc<dyn CommentsRepo>, writer: Arc<dyn CommentsWriteRepo>) -> Self {
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

    /// Comments on a post, oldest first. Unknown posts have no comments.
    pub async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentView>, AppError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get_comments(post_id) {
                return Ok(cached);
            }
            let seen = cache.generation(&QueryKey::Comments(post_id));
            let comments = self.load_comments(post_id).await?;
            cache.set_comments(post_id, comments.clone(), seen);
            Ok(comments)
        } else {
            self.load_comments(post_id).await
        }
    }

    pub async fn create_comment(
        &self,
        session: &Session,
        post_id: Uuid,
        command: CreateCommentCommand,
    ) -> Result<CommentView, AppError> {
        let identity = session.require_authenticated()?;
        ensure_non_blank(&command.content, "content")?;

        let params = CreateCommentParams {
            post_id,
            author_id: identity.user_id,
            content: command.content.trim().to_string(),
        };
        let created = self.writer.create_comment(params).await?;
        info!(
            target = "application::comments::create_comment",
            comment_id = %created.comment.id,
            post_id = %post_id,
            author_id = %identity.user_id,
            "comment created"
        );

        if let Some(trigger) = &self.cache_trigger {
            trigger.comment_created(post_id);
        }

        Ok(CommentView::from(created))
    }

    async fn load_comments(&self, post_id: Uuid) -> Result<Vec<CommentView>, AppError> {
        let comments = self.reader.list_comments(post_id).await?;
        Ok(comments.into_iter().map(CommentView::from).collect())
    }
}
