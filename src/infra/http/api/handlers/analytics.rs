use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

pub async fn get_analytics(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let summary = state.analytics.summary().await?;
    Ok(Json(summary))
}
