//! Shared application state for the Stargate server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`.

use stargate_core::database::Database;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// The credential database.
    pub database: Database,
    /// Gateway endpoint returned to clients on registration.
    pub endpoint: String,
    admin_token: String,
}

impl AppState {
    /// Build state from its collaborators.
    ///
    /// An empty `admin_token` matches no request, so every admin route
    /// answers 401.
    #[must_use]
    pub fn new(database: Database, endpoint: impl Into<String>, admin_token: impl Into<String>) -> Self {
        Self {
            database,
            endpoint: endpoint.into(),
            admin_token: admin_token.into(),
        }
    }

    /// The configured admin bearer token.
    pub(crate) fn admin_token(&self) -> &str {
        &self.admin_token
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
