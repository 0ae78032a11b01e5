//! Comments handlers

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::session::Session;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::CommentCreateRequest;
use crate::infra::http::api::state::ApiState;

pub async fn list_comments(
    State(state): State<ApiState>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state.comments.list_comments(post_id).await?;
    Ok(Json(comments))
}

pub async fn create_comment(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CommentCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .comments
        .create_comment(&session, post_id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
