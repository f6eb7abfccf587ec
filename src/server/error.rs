//! Mapping of feed errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::feed::core::errors::{ErrorKind, FeedError};

/// Error wrapper returned by route handlers.
#[derive(Debug)]
pub struct ApiError(pub FeedError);

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        Self(err)
    }
}

/// Status code for an error kind.
#[must_use]
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Dependency => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            tracing::error!(error = %self.0, kind = kind.as_str(), "request failed");
        }
        let body = serde_json::json!({
            "error": kind.as_str(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
