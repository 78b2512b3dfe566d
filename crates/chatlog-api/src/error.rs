//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chatlog_core::{ChatlogError, CoreError};
use serde::Serialize;
use tracing::error;

/// Error returned by handlers, rendered as `{"error":{"code","message"}}`.
#[derive(Debug)]
pub struct ApiError(pub ChatlogError);

/// Error response with code and message.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error details including code and message
    pub error: ErrorDetail,
}

/// Detailed error information.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code from the E1001-E9999 taxonomy
    pub code: String,
    /// Human-readable error description
    pub message: String,
}

impl ApiError {
    /// HTTP status for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ChatlogError::InvalidSignature
            | ChatlogError::MissingSignature { .. }
            | ChatlogError::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            ChatlogError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ChatlogError::MessagingApi(_) => StatusCode::BAD_GATEWAY,
            ChatlogError::Storage(_) | ChatlogError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ChatlogError> for ApiError {
    fn from(err: ChatlogError) -> Self {
        Self(err)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(ChatlogError::Storage(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match status {
            StatusCode::BAD_GATEWAY => "Upstream service error".to_string(),
            status if status.is_server_error() => "Internal server error".to_string(),
            _ => self.0.to_string(),
        };
        if status.is_server_error() {
            error!(code = self.0.code(), error = %self.0, "Request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail { code: self.0.code().to_string(), message },
        };

        (status, Json(body)).into_response()
    }
}
