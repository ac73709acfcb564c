//! HTTP error types for the Stargate server.
//!
//! Maps [`DatabaseError`] kinds into HTTP responses. Every error produces a
//! JSON body with a machine-readable `error` field and a human-readable
//! `message`. Backend detail is logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use stargate_core::error::DatabaseError;

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Missing or wrong admin token.
    Unauthorized(String),
    /// The credential exists but was invalidated.
    Forbidden(String),
    /// Unknown credential, or one that cannot be opened.
    NotFound,
    /// Client sent invalid input.
    BadRequest(String),
    /// Internal server error. The detail is logged, not returned.
    Internal,
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                "credential not found".to_owned(),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error".to_owned(),
            ),
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::MalformedAccessKeyId | DatabaseError::MalformedGrant { .. } => {
                Self::BadRequest(err.to_string())
            }
            DatabaseError::NotFound | DatabaseError::DecryptFailure => Self::NotFound,
            DatabaseError::Invalid { .. } => Self::Forbidden(err.to_string()),
            DatabaseError::Conflict | DatabaseError::Internal { .. } => {
                error!(error = %err, "credential database failure");
                Self::Internal
            }
        }
    }
}
