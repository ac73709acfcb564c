//! Server configuration for Stargate.
//!
//! Loads configuration from environment variables with sensible defaults.
//! All settings can be overridden via `STARGATE_*` environment variables;
//! only the admin token is required.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 8000);
const DEFAULT_ENDPOINT: &str = "http://localhost:7777";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors loading [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `STARGATE_ADMIN_TOKEN` is unset or empty.
    #[error("STARGATE_ADMIN_TOKEN must be set to a non-empty value")]
    MissingAdminToken,

    /// `STARGATE_STORAGE=postgres` without `DATABASE_URL`.
    #[error("DATABASE_URL must be set when STARGATE_STORAGE is postgres")]
    MissingDatabaseUrl,

    /// A variable held a value that could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Storage backend type.
    pub storage_backend: StorageBackendType,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Gateway endpoint returned to clients on registration.
    pub endpoint: String,
    /// Bearer token guarding the admin routes.
    pub admin_token: String,
    /// Upper bound on a single request.
    pub request_timeout: Duration,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("storage_backend", &self.storage_backend)
            .field("log_level", &self.log_level)
            .field("endpoint", &self.endpoint)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// Supported storage backend types.
#[derive(Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, data lost on restart).
    Memory,
    /// PostgreSQL persistent storage.
    Postgres { url: String },
}

impl fmt::Debug for StorageBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("Memory"),
            Self::Postgres { .. } => f.write_str("Postgres { url: [redacted] }"),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`: port to bind on (binds to `0.0.0.0`)
    /// - `STARGATE_BIND_ADDR`: full bind address (overrides `PORT`, default: `127.0.0.1:8000`)
    /// - `STARGATE_STORAGE`: `memory` or `postgres` (default: `memory`)
    /// - `DATABASE_URL`: PostgreSQL connection string (required when `STARGATE_STORAGE=postgres`)
    /// - `STARGATE_LOG_LEVEL`: log filter (default: `info`)
    /// - `STARGATE_ENDPOINT`: gateway endpoint hint (default: `http://localhost:7777`)
    /// - `STARGATE_ADMIN_TOKEN`: admin bearer token (required)
    /// - `STARGATE_REQUEST_TIMEOUT`: seconds per request (default: `30`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Priority: STARGATE_BIND_ADDR > PORT > default
        let bind_addr = if let Some(addr) = lookup("STARGATE_BIND_ADDR") {
            addr.parse().map_err(|_| ConfigError::InvalidValue {
                var: "STARGATE_BIND_ADDR",
                value: addr,
            })?
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port.parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT",
                value: port,
            })?;
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(DEFAULT_BIND_ADDR)
        };

        let storage_backend = match lookup("STARGATE_STORAGE")
            .unwrap_or_else(|| "memory".to_owned())
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackendType::Memory,
            "postgres" | "postgresql" => StorageBackendType::Postgres {
                url: lookup("DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?,
            },
            other => {
                return Err(ConfigError::InvalidValue {
                    var: "STARGATE_STORAGE",
                    value: other.to_owned(),
                });
            }
        };

        let log_level = lookup("STARGATE_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());
        let endpoint = lookup("STARGATE_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned());

        let admin_token = lookup("STARGATE_ADMIN_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingAdminToken)?;

        let request_timeout = match lookup("STARGATE_REQUEST_TIMEOUT") {
            Some(secs) => Duration::from_secs(secs.parse().map_err(|_| ConfigError::InvalidValue {
                var: "STARGATE_REQUEST_TIMEOUT",
                value: secs,
            })?),
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self {
            bind_addr,
            storage_backend,
            log_level,
            endpoint,
            admin_token,
            request_timeout,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_with_admin_token() {
        let config = load(&[("STARGATE_ADMIN_TOKEN", "t")]).unwrap();
        assert_eq!(config.bind_addr, SocketAddr::from(DEFAULT_BIND_ADDR));
        assert_eq!(config.storage_backend, StorageBackendType::Memory);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.admin_token, "t");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_or_empty_admin_token_is_an_error() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingAdminToken)));
        assert!(matches!(
            load(&[("STARGATE_ADMIN_TOKEN", "")]),
            Err(ConfigError::MissingAdminToken)
        ));
    }

    #[test]
    fn bind_addr_overrides_port() {
        let config = load(&[
            ("STARGATE_ADMIN_TOKEN", "t"),
            ("STARGATE_BIND_ADDR", "10.0.0.1:9000"),
            ("PORT", "1234"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "10.0.0.1:9000");

        let config = load(&[("STARGATE_ADMIN_TOKEN", "t"), ("PORT", "1234")]).unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:1234");
    }

    #[test]
    fn postgres_requires_database_url() {
        assert!(matches!(
            load(&[("STARGATE_ADMIN_TOKEN", "t"), ("STARGATE_STORAGE", "postgres")]),
            Err(ConfigError::MissingDatabaseUrl)
        ));

        let config = load(&[
            ("STARGATE_ADMIN_TOKEN", "t"),
            ("STARGATE_STORAGE", "Postgres"),
            ("DATABASE_URL", "postgres://u:p@db/stargate"),
        ])
        .unwrap();
        assert_eq!(
            config.storage_backend,
            StorageBackendType::Postgres {
                url: "postgres://u:p@db/stargate".to_owned()
            }
        );
        assert!(!format!("{config:?}").contains("u:p@db"));
    }

    #[test]
    fn rejects_unparseable_values() {
        assert!(matches!(
            load(&[("STARGATE_ADMIN_TOKEN", "t"), ("PORT", "http")]),
            Err(ConfigError::InvalidValue { var: "PORT", .. })
        ));
        assert!(matches!(
            load(&[("STARGATE_ADMIN_TOKEN", "t"), ("STARGATE_STORAGE", "rocksdb")]),
            Err(ConfigError::InvalidValue { var: "STARGATE_STORAGE", .. })
        ));
        assert!(matches!(
            load(&[("STARGATE_ADMIN_TOKEN", "t"), ("STARGATE_REQUEST_TIMEOUT", "soon")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn debug_hides_admin_token() {
        let config = load(&[("STARGATE_ADMIN_TOKEN", "hunter2")]).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
