//! HTTP error envelope and the mapping from domain errors to status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use voxserve_core::VoxError;

/// Error returned to HTTP clients as a JSON body `{"error": ..., "hint": ...}`.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    hint: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'a str>,
}

impl ApiError {
    /// A 400 with the given message.
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a hint shown alongside the error message.
    #[must_use]
    pub fn with_hint<S: Into<String>>(mut self, hint: S) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Status code this error maps to.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<VoxError> for ApiError {
    fn from(err: VoxError) -> Self {
        let status = match &err {
            VoxError::Validation { .. } | VoxError::Immutable { .. } | VoxError::Download { .. } => {
                StatusCode::BAD_REQUEST
            }
            VoxError::NotFound { .. } => StatusCode::NOT_FOUND,
            VoxError::Persistence { .. }
            | VoxError::LoadFailed { .. }
            | VoxError::Synthesis { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
            hint: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        } else {
            tracing::debug!(status = %self.status, error = %self.message, "request rejected");
        }
        let body = ErrorBody {
            error: &self.message,
            hint: self.hint.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (VoxError::validation("bad"), StatusCode::BAD_REQUEST),
            (VoxError::immutable("emma"), StatusCode::BAD_REQUEST),
            (VoxError::download("offline"), StatusCode::BAD_REQUEST),
            (VoxError::not_found("ghost"), StatusCode::NOT_FOUND),
            (
                VoxError::persistence("disk"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                VoxError::load_failed("corrupt"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                VoxError::synthesis("engine"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
