//! Admin authentication.
//!
//! [`AdminAuth`] is an extractor that checks the `Authorization: Bearer
//! <token>` header against the configured admin token in constant time.
//! Extractors run only after the router has matched both path and method,
//! so unknown paths still answer 404 and wrong methods 405 without a token.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Proof that the request carried the admin bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix(BEARER_PREFIX));

        let Some(presented) = presented else {
            debug!(path = %parts.uri.path(), "admin request without bearer token");
            return Err(AppError::Unauthorized("missing bearer token".to_owned()));
        };

        if !token_matches(presented, state.admin_token()) {
            debug!(path = %parts.uri.path(), "admin request with wrong bearer token");
            return Err(AppError::Unauthorized("invalid bearer token".to_owned()));
        }

        Ok(Self)
    }
}

/// Constant-time comparison. An empty configured token never matches.
fn token_matches(presented: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}
