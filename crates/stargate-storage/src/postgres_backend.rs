//! PostgreSQL record store.
//!
//! Stores every record as one row of the `records` table, keyed by the raw
//! key hash. Uniqueness comes from the primary key and the first-reason-wins
//! rule comes from a conditional update, so both hold across processes
//! sharing one database.
//!
//! Feature-gated behind `postgres-backend`. Uses `sqlx` with the Tokio
//! runtime for fully async operations; no `spawn_blocking` needed.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::{KeyHash, Record, RecordStore, StorageError};

/// A record store backed by PostgreSQL.
///
/// Thread-safe via `PgPool` (connection pool). All operations are fully async.
///
/// # Examples
///
/// ```no_run
/// # use stargate_storage::PostgresStore;
/// # #[tokio::main]
/// # async fn main() {
/// let store = PostgresStore::connect("postgres://localhost/stargate").await.unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore")
            .field("pool", &"[PgPool]")
            .finish_non_exhaustive()
    }
}

type RecordRow = (String, Vec<u8>, Vec<u8>, Vec<u8>, bool, Option<String>);

impl PostgresStore {
    /// Connect to PostgreSQL and create the `records` table if missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the connection or migration fails.
    /// The connection string is never included in the error.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Open {
                path: "[redacted]".to_owned(),
                reason: e.to_string(),
            })?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS records (\
                key_hash               BYTEA       PRIMARY KEY, \
                satellite_address      TEXT        NOT NULL, \
                macaroon_head          BYTEA       NOT NULL, \
                encrypted_secret_key   BYTEA       NOT NULL, \
                encrypted_access_grant BYTEA       NOT NULL, \
                public                 BOOLEAN     NOT NULL DEFAULT FALSE, \
                invalid_reason         TEXT, \
                invalidated_at         TIMESTAMPTZ, \
                created_at             TIMESTAMPTZ NOT NULL DEFAULT NOW()\
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| StorageError::Open {
            path: "[redacted]".to_owned(),
            reason: format!("migration failed: {e}"),
        })?;

        Ok(Self { pool })
    }

    /// Return a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl RecordStore for PostgresStore {
    async fn put(&self, key: &KeyHash, record: &Record) -> Result<(), StorageError> {
        let result = sqlx::query(
            "INSERT INTO records \
                (key_hash, satellite_address, macaroon_head, \
                 encrypted_secret_key, encrypted_access_grant, public) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (key_hash) DO NOTHING",
        )
        .bind(key.as_bytes().as_slice())
        .bind(&record.satellite_address)
        .bind(&record.macaroon_head)
        .bind(&record.encrypted_secret_key)
        .bind(&record.encrypted_access_grant)
        .bind(record.public)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    async fn get(&self, key: &KeyHash) -> Result<Option<Record>, StorageError> {
        let row: Option<RecordRow> = sqlx::query_as(
            "SELECT satellite_address, macaroon_head, encrypted_secret_key, \
                    encrypted_access_grant, public, invalid_reason \
             FROM records WHERE key_hash = $1",
        )
        .bind(key.as_bytes().as_slice())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Read {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let Some((
            satellite_address,
            macaroon_head,
            encrypted_secret_key,
            encrypted_access_grant,
            public,
            invalid_reason,
        )) = row
        else {
            return Ok(None);
        };

        if let Some(reason) = invalid_reason {
            return Err(StorageError::Invalid { reason });
        }

        Ok(Some(Record {
            satellite_address,
            macaroon_head,
            encrypted_secret_key,
            encrypted_access_grant,
            public,
        }))
    }

    async fn delete(&self, key: &KeyHash) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM records WHERE key_hash = $1")
            .bind(key.as_bytes().as_slice())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Delete {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        Ok(())
    }

    async fn invalidate(&self, key: &KeyHash, reason: &str) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE records SET invalid_reason = $2, invalidated_at = NOW() \
             WHERE key_hash = $1 AND invalid_reason IS NULL",
        )
        .bind(key.as_bytes().as_slice())
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Invalidate {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        Ok(())
    }
}
