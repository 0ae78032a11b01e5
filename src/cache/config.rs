//! Cache configuration.

use std::num::NonZeroUsize;

use serde::Deserialize;

const DEFAULT_POST_LIMIT: usize = 500;
const DEFAULT_COMMENT_LIST_LIMIT: usize = 200;
const DEFAULT_PROFILE_LIMIT: usize = 500;
const DEFAULT_CONSUME_BATCH_LIMIT: usize = 100;

/// Cache configuration from the `[cache]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the query cache. When off, services read straight from the store.
    pub enabled: bool,
    /// Maximum single-post entries.
    pub post_limit: usize,
    /// Maximum per-post comment lists.
    pub comment_list_limit: usize,
    /// Maximum profile entries.
    pub profile_limit: usize,
    /// Maximum events per consumption batch.
    pub consume_batch_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            post_limit: DEFAULT_POST_LIMIT,
            comment_list_limit: DEFAULT_COMMENT_LIST_LIMIT,
            profile_limit: DEFAULT_PROFILE_LIMIT,
            consume_batch_limit: DEFAULT_CONSUME_BATCH_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            post_limit: settings.post_limit,
            comment_list_limit: settings.comment_list_limit,
            profile_limit: settings.profile_limit,
            consume_batch_limit: settings.consume_batch_limit,
        }
    }
}

impl CacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the post limit as NonZeroUsize, clamping to 1 if zero.
    pub fn post_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.post_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the comment list limit as NonZeroUsize, clamping to 1 if zero.
    pub fn comment_list_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.comment_list_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the profile limit as NonZeroUsize, clamping to 1 if zero.
    pub fn profile_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.profile_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.post_limit, 500);
        assert_eq!(config.comment_list_limit, 200);
        assert_eq!(config.profile_limit, 500);
        assert_eq!(config.consume_batch_limit, 100);
    }

    #[test]
    fn disabled_when_switched_off() {
        let config = CacheConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(!config.is_enabled());
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            post_limit: 0,
            profile_limit: 0,
            ..Default::default()
        };
        assert_eq!(config.post_limit_non_zero().get(), 1);
        assert_eq!(config.profile_limit_non_zero().get(), 1);
        assert_eq!(config.comment_list_limit_non_zero().get(), 200);
    }
}
