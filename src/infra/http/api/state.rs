use std::sync::Arc;

use crate::application::analytics::AnalyticsService;
use crate::application::comments::CommentService;
use crate::application::posts::PostService;
use crate::application::profiles::ProfileService;
use crate::application::repos::HealthRepo;
use crate::application::session::IdentityProvider;

#[derive(Clone)]
pub struct ApiState {
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub profiles: Arc<ProfileService>,
    pub analytics: Arc<AnalyticsService>,
    pub identity: Arc<dyn IdentityProvider>,
    pub health: Arc<dyn HealthRepo>,
}
