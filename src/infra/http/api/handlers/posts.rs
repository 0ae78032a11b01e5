//! Posts handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::listing::PostQueryFilter;
use crate::application::session::Session;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{PostCreateRequest, PostUpdateRequest};
use crate::infra::http::api::state::ApiState;

use super::PostListQuery;

pub async fn list_posts(
    State(state): State<ApiState>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = PostQueryFilter::try_from(query)?;
    let posts = state.posts.search_posts(&filter).await?;
    Ok(Json(posts))
}

pub async fn list_tags(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let tags = state.posts.list_tags().await?;
    Ok(Json(tags))
}

/// Returns the post and records a view in the background.
pub async fn get_post(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.get_post(id).await?;

    let posts = state.posts.clone();
    tokio::spawn(async move {
        posts.record_view(id).await;
    });

    Ok(Json(post))
}

pub async fn create_post(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<PostCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.create_post(&session, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.update_post(&session, id, payload.into()).await?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.posts.delete_post(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
