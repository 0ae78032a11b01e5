use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::{error::ErrorReport, session::Session};

/// Correlation id, taken from the gateway when present.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let ctx = RequestContext { request_id };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

struct FailedRequest {
    status: StatusCode,
    method: Method,
    path: String,
    elapsed_ms: u128,
    request_id: String,
    user_id: String,
    report: Option<ErrorReport>,
}

impl FailedRequest {
    fn emit(self) {
        let (source, chain) = match self.report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = chain
            .first()
            .map(String::as_str)
            .unwrap_or("no diagnostic available");

        if self.status.is_server_error() {
            error!(
                target = "inkpost::http::response",
                status = self.status.as_u16(),
                method = %self.method,
                path = %self.path,
                elapsed_ms = self.elapsed_ms,
                request_id = %self.request_id,
                user_id = %self.user_id,
                source,
                detail,
                chain = ?chain,
                "request failed"
            );
        } else {
            warn!(
                target = "inkpost::http::response",
                status = self.status.as_u16(),
                method = %self.method,
                path = %self.path,
                elapsed_ms = self.elapsed_ms,
                request_id = %self.request_id,
                user_id = %self.user_id,
                source,
                detail,
                chain = ?chain,
                "request rejected"
            );
        }
    }
}

/// Log 4xx/5xx responses together with their [`ErrorReport`], if one was attached.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let started_at = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let user_id = response
        .extensions()
        .get::<Session>()
        .and_then(Session::identity)
        .map(|identity| identity.user_id.to_string())
        .unwrap_or_default();

    FailedRequest {
        status,
        method,
        path,
        elapsed_ms: started_at.elapsed().as_millis(),
        request_id,
        user_id,
        report: response.extensions_mut().remove::<ErrorReport>(),
    }
    .emit();

    response
}
