//! Search, tag filtering and ordering over the post list.
//!
//! Applied in memory on top of the cached newest-first list, so every
//! combination of filters shares one cache entry.

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::application::error::AppError;
use crate::application::views::BlogPostView;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostSort {
    #[default]
    Newest,
    Oldest,
    /// Most viewed first; ties stay newest first.
    Popular,
}

impl FromStr for PostSort {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" | "newest" => Ok(PostSort::Newest),
            "oldest" => Ok(PostSort::Oldest),
            "popular" => Ok(PostSort::Popular),
            other => Err(AppError::validation(format!(
                "unknown sort order `{other}`; expected newest, oldest or popular"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostQueryFilter {
    /// Case-insensitive match against title, content and author name.
    pub search: Option<String>,
    /// Exact tag match.
    pub tag: Option<String>,
    pub sort: PostSort,
}

impl PostQueryFilter {
    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    fn tag(&self) -> Option<&str> {
        self.tag
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
    }

    /// Filter and order `posts`, which must already be newest first.
    pub fn apply(&self, posts: Vec<BlogPostView>) -> Vec<BlogPostView> {
        let term = self.search_term();
        let tag = self.tag();

        let mut matched: Vec<BlogPostView> = posts
            .into_iter()
            .filter(|post| term.as_deref().is_none_or(|term| matches_search(post, term)))
            .filter(|post| tag.is_none_or(|tag| post.tags.iter().any(|t| t == tag)))
            .collect();

        match self.sort {
            PostSort::Newest => {}
            PostSort::Oldest => matched.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            }),
            PostSort::Popular => matched.sort_by(|a, b| b.views.cmp(&a.views)),
        }
        matched
    }
}

fn matches_search(post: &BlogPostView, term: &str) -> bool {
    [&post.title, &post.content, &post.author.name]
        .into_iter()
        .any(|field| field.to_lowercase().contains(term))
}

/// Every tag used by `posts`, sorted and deduplicated.
pub fn collect_tags(posts: &[BlogPostView]) -> Vec<String> {
    posts
        .iter()
        .flat_map(|post| post.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
