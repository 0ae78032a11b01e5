use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::error::ApiError;
use super::state::ApiState;

/// Subject id forwarded by the authentication gateway.
pub const IDENTITY_HEADER: &str = "x-user-id";

/// The raw forwarded subject, if any. A non-ascii value is rejected.
pub fn subject_header(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    match headers.get(IDENTITY_HEADER) {
        Some(value) => value.to_str().map(Some).map_err(|_| {
            debug!("identity header is not valid ascii");
            ApiError::unauthorized()
        }),
        None => Ok(None),
    }
}

/// Resolve the caller's [`Session`](crate::application::session::Session) and
/// make it available to handlers as a request extension.
pub async fn resolve_session(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let subject = match subject_header(request.headers()) {
        Ok(subject) => subject.map(str::to_string),
        Err(err) => return err.into_response(),
    };

    let session = match state.identity.current_session(subject.as_deref()).await {
        Ok(session) => session,
        Err(err) => return ApiError::from(err).into_response(),
    };

    request.extensions_mut().insert(session.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(session);
    response
}
