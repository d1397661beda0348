//! # API Error Types
//!
//! Every failure leaves the API as the same JSON envelope:
//!
//! ```json
//! { "success": false, "error": "Token expired", "code": "TOKEN_EXPIRED" }
//! ```
//!
//! `error` is for humans, `code` is the stable machine-readable value
//! clients branch on. Internal error details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::AuthError;

/// Structured JSON error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Human-readable message.
    pub error: String,
    /// Machine-readable code, e.g. `"INVALID_TOKEN"`.
    pub code: String,
}

impl ErrorBody {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            code: code.to_string(),
        }
    }

    /// Render with the given status.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Application-level error for handlers outside the auth gate.
#[derive(Error, Debug)]
pub enum AppError {
    /// Authentication failure surfaced from a handler or extractor.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// A dependency is not ready to serve (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Auth(err) => (err.status(), err.code()),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match self {
            Self::Auth(err) => return err.into_response(),
            Self::Internal(ref detail) => {
                tracing::error!(error = %detail, "internal server error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        ErrorBody::new(code, message).into_response_with(status)
    }
}
