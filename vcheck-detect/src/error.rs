//! Error types for vcheck-detect
//!
//! [`DetectError`] is raised by the analysis engine; [`ApiError`] is the HTTP
//! boundary's view of it (and of authentication/request failures).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use vcheck_common::api::ApiAuthError;

/// Engine error taxonomy
///
/// None of these are retried inside the engine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DetectError {
    /// Declared container format is not the supported one
    #[error("Unsupported audio format '{declared}': only '{supported}' is accepted")]
    UnsupportedFormat { declared: String, supported: String },

    /// Payload empty, corrupt, or not decodable
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    /// Clip too short or too silent to analyze
    #[error("Insufficient audio: {0}")]
    InsufficientAudio(String),

    /// Numerically degenerate intermediate value (NaN/Inf, zero variance)
    #[error("Internal computation error: {0}")]
    InternalComputation(String),
}

/// Result type for engine operations
pub type DetectResult<T> = Result<T, DetectError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Authentication failure (401 / 403)
    #[error("{0}")]
    Auth(#[from] ApiAuthError),

    /// Engine failure, status depends on the variant
    #[error("{0}")]
    Detect(#[from] DetectError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(ApiAuthError::MissingKey) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(ApiAuthError::InvalidKey) => StatusCode::FORBIDDEN,
            ApiError::Detect(DetectError::UnsupportedFormat { .. })
            | ApiError::Detect(DetectError::Decode(_)) => StatusCode::BAD_REQUEST,
            ApiError::Detect(DetectError::InsufficientAudio(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Detect(DetectError::InternalComputation(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let unsupported = ApiError::from(DetectError::UnsupportedFormat {
            declared: "wav".to_string(),
            supported: "mp3".to_string(),
        });
        assert_eq!(unsupported.status_code(), StatusCode::BAD_REQUEST);

        let decode = ApiError::from(DetectError::Decode("garbage".to_string()));
        assert_eq!(decode.status_code(), StatusCode::BAD_REQUEST);

        let short = ApiError::from(DetectError::InsufficientAudio("0.1s".to_string()));
        assert_eq!(short.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let internal = ApiError::from(DetectError::InternalComputation("nan".to_string()));
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            ApiError::from(ApiAuthError::MissingKey).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(ApiAuthError::InvalidKey).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_unsupported_format_message_names_both_formats() {
        let err = DetectError::UnsupportedFormat {
            declared: "wav".to_string(),
            supported: "mp3".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'wav'"));
        assert!(msg.contains("'mp3'"));
    }
}
