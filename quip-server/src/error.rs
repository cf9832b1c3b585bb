//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quip_core::QuipError;
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Quip core error - error from the similarity engine
    #[error("Quip error: {0}")]
    Quip(#[from] QuipError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Quip(ref e) => match e {
                // Client-provided invalid input → 400
                QuipError::Validation(_)
                | QuipError::DigestLengthMismatch { .. }
                | QuipError::PerceptualHash(_) => StatusCode::BAD_REQUEST,

                // Lock poisoning or backend failures → 500
                QuipError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Quip(ref e) => match e {
                QuipError::Validation(_) => "INVALID_INPUT",
                QuipError::DigestLengthMismatch { .. } => "DIGEST_LENGTH_MISMATCH",
                QuipError::Storage(_) => "STORAGE_ERROR",
                QuipError::PerceptualHash(_) => "IMAGE_DECODE_FAILED",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            Self::Quip(QuipError::Storage(_)) => "Internal server error".to_string(),
            Self::Quip(QuipError::PerceptualHash(_)) => {
                "Could not decode image data".to_string()
            }
            // Validation messages are safe to echo back
            Self::Quip(e) => e.to_string(),
            Self::BadRequest(_) => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Quip(_) => "quip",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quip_core::HashType;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = ApiError::from(QuipError::validation("empty query"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_length_mismatch_code() {
        let err = ApiError::from(QuipError::DigestLengthMismatch {
            hash_type: HashType::Block,
            expected: 8,
            actual: 4,
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "DIGEST_LENGTH_MISMATCH");
    }

    #[test]
    fn test_storage_is_sanitized() {
        let err = ApiError::from(QuipError::storage("lock poisoned"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "STORAGE_ERROR");
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_perceptual_hash_code() {
        let err = ApiError::from(QuipError::PerceptualHash("bad magic".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "IMAGE_DECODE_FAILED");
    }
}
