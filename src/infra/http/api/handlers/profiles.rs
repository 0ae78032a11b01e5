//! Profiles handlers

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::session::{Session, Subject};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::middleware::subject_header;
use crate::infra::http::api::models::{ProfileCreateRequest, ProfileUpdateRequest};
use crate::infra::http::api::state::ApiState;

/// Registration runs outside session resolution: the subject has no profile yet.
pub async fn create_profile(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(payload): Json<ProfileCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let subject =
        Subject::parse(subject_header(&headers)?)?.ok_or_else(ApiError::unauthorized)?;
    let profile = state
        .profiles
        .create_profile(&subject, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn get_profile(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.profiles.get_profile(id).await?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .profiles
        .update_profile(&session, id, payload.into())
        .await?;
    Ok(Json(profile))
}
