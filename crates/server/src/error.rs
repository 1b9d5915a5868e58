//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use calbridge_domain::CalBridgeError;
use serde_json::json;
use tracing::warn;

/// Error type returned by every handler.
///
/// Wraps the domain error so status mapping lives in one place. Bodies are
/// always `{"error": "<short message>"}` with no internal detail.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    /// Missing or empty identity header.
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "missing user identity")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<CalBridgeError> for ApiError {
    fn from(err: CalBridgeError) -> Self {
        let status = match &err {
            CalBridgeError::NotFound(_) => StatusCode::NOT_FOUND,
            CalBridgeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CalBridgeError::FetchFailed(_) | CalBridgeError::Network(_) => {
                StatusCode::BAD_GATEWAY
            }
            CalBridgeError::Database(_)
            | CalBridgeError::Config(_)
            | CalBridgeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            warn!(error = %err, "request failed");
        }

        Self { status, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
