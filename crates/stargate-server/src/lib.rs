//! Stargate HTTP server.
//!
//! Wires the credential [`Database`](stargate_core::database::Database) into
//! an Axum router. Registration at `POST /v1/access` is public; fetching,
//! invalidating and deleting a credential under `/v1/access/{id}` require the
//! admin bearer token.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
