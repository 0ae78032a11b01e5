//! API handlers organized by resource type.

mod analytics;
mod comments;
mod posts;
mod profiles;

use serde::Deserialize;

use crate::application::error::AppError;
use crate::application::listing::{PostQueryFilter, PostSort};

pub use analytics::*;
pub use comments::*;
pub use posts::*;
pub use profiles::*;

#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub search: Option<String>,
    pub tag: Option<String>,
    /// `newest` (default), `oldest` or `popular`.
    pub sort: Option<String>,
}

impl TryFrom<PostListQuery> for PostQueryFilter {
    type Error = AppError;

    fn try_from(query: PostListQuery) -> Result<Self, Self::Error> {
        let sort = match query.sort.as_deref() {
            Some(sort) => sort.parse()?,
            None => PostSort::default(),
        };
        Ok(Self {
            search: query.search,
            tag: query.tag,
            sort,
        })
    }
}
