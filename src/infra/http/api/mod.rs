pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::infra::http::middleware::log_responses;

pub fn build_api_router(state: ApiState) -> Router<ApiState> {
    let session_state = state.clone();

    let registration = Router::new().route("/api/v1/profiles", post(handlers::create_profile));

    Router::new()
        .route(
            "/api/v1/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route(
            "/api/v1/posts/{id}",
            get(handlers::get_post)
                .patch(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route(
            "/api/v1/posts/{id}/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route("/api/v1/tags", get(handlers::list_tags))
        .route(
            "/api/v1/profiles/{id}",
            get(handlers::get_profile).patch(handlers::update_profile),
        )
        .route("/api/v1/analytics", get(handlers::get_analytics))
        .layer(axum_middleware::from_fn_with_state(
            session_state,
            middleware::resolve_session,
        ))
        .merge(registration)
        .layer(axum_middleware::from_fn(log_responses))
}
