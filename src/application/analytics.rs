//! Site-wide totals.

use std::sync::Arc;

use crate::application::error::AppError;
use crate::application::repos::AnalyticsRepo;
use crate::application::views::AnalyticsView;
use crate::cache::{CacheHandles, QueryKey, QueryStore};

#[derive(Clone)]
pub struct AnalyticsService {
    repo: Arc<dyn AnalyticsRepo>,
    cache: Option<Arc<QueryStore>>,
}

impl AnalyticsService {
    pub fn new(repo: Arc<dyn AnalyticsRepo>) -> Self {
        Self { repo, cache: None }
    }

    pub fn with_cache_opt(mut self, cache: Option<CacheHandles>) -> Self {
        self.cache = cache.map(|handles| handles.store);
        self
    }

    pub async fn summary(&self) -> Result<AnalyticsView, AppError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get_analytics() {
                return Ok(cached);
            }
            let seen = cache.generation(&QueryKey::Analytics);
            let summary = self.load_summary().await?;
            cache.set_analytics(summary, seen);
            Ok(summary)
        } else {
            self.load_summary().await
        }
    }

    async fn load_summary(&self) -> Result<AnalyticsView, AppError> {
        Ok(self.repo.snapshot().await?.into())
    }
}
