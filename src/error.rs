//! HTTP-facing error type.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Errors surfaced to API callers.
///
/// Every variant renders as `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required body field was absent.
    #[error("Invalid request. '{0}' field is required")]
    InvalidRequest(&'static str),

    /// Any other fault while handling the request.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Server error");
        } else {
            tracing::warn!(error = %self, "Rejected request");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_message() {
        let err = ApiError::InvalidRequest("message");
        assert_eq!(err.to_string(), "Invalid request. 'message' field is required");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_json_error_is_internal() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = ApiError::from(parse);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
