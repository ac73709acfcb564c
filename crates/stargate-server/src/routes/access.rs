//! Credential routes: `/v1/access` and `/v1/access/{id}`.
//!
//! Register a grant, then fetch, invalidate or delete the issued credential.
//! Request bodies are parsed from raw bytes, so clients need not send a
//! `Content-Type` header.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::AdminAuth;
use crate::state::AppState;

/// Build the unauthenticated registration router.
pub fn public_router() -> Router<Arc<AppState>> {
    Router::new().route("/v1/access", post(create_access))
}

/// Build the admin router. Every handler requires [`AdminAuth`].
pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/access/{id}", get(fetch_access).delete(delete_access))
        .route("/v1/access/{id}/invalid", put(invalidate_access))
}

// ── Request / Response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateAccessRequest {
    pub access_grant: String,
    #[serde(default)]
    pub public: bool,
}

#[derive(Serialize)]
pub struct CreateAccessResponse {
    pub access_key_id: String,
    pub secret_key: String,
    pub endpoint: String,
}

#[derive(Serialize)]
pub struct FetchAccessResponse {
    pub access_grant: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    pub public: bool,
}

#[derive(Debug, Deserialize)]
pub struct InvalidateAccessRequest {
    pub reason: String,
}

/// Serializes as `{}`.
#[derive(Debug, Serialize)]
pub struct EmptyResponse {}

// ── Handlers ─────────────────────────────────────────────────────────

async fn create_access(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CreateAccessResponse>, AppError> {
    let request: CreateAccessRequest = parse_body(&body)?;

    let registration = state
        .database
        .register(&request.access_grant, request.public)
        .await?;

    Ok(Json(CreateAccessResponse {
        access_key_id: registration.access_key_id,
        secret_key: registration.secret_key.expose().to_owned(),
        endpoint: state.endpoint.clone(),
    }))
}

async fn fetch_access(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<FetchAccessResponse>, AppError> {
    let resolved = state.database.resolve(&id).await?;

    let secret_key = (!resolved.public).then(|| resolved.secret_key.expose().to_owned());
    Ok(Json(FetchAccessResponse {
        access_grant: resolved.access_grant.as_str().to_owned(),
        secret_key,
        public: resolved.public,
    }))
}

async fn invalidate_access(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<EmptyResponse>, AppError> {
    let request: InvalidateAccessRequest = parse_body(&body)?;
    state.database.invalidate_by_id(&id, &request.reason).await?;
    Ok(Json(EmptyResponse {}))
}

async fn delete_access(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<EmptyResponse>, AppError> {
    state.database.delete_by_id(&id).await?;
    Ok(Json(EmptyResponse {}))
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid request body: {e}")))
}
