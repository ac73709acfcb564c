//! Record storage abstraction for Stargate.
//!
//! This crate defines the [`RecordStore`] trait, a keyed store of credential
//! [`Record`]s indexed by [`KeyHash`]. It knows nothing about how records are
//! sealed or how access keys are derived; the credential codec in
//! `stargate-core` encrypts every secret field before a record reaches this
//! layer, and the store key is a one-way hash of the access key.
//!
//! Two implementations are provided:
//!
//! - [`MemoryStore`]: in-memory, for tests and single-process deployments
//! - [`PostgresStore`]: durable, backed by PostgreSQL (feature `postgres-backend`)

mod error;
mod memory;
#[cfg(feature = "postgres-backend")]
mod postgres_backend;
mod record;

pub use error::StorageError;
pub use memory::MemoryStore;
#[cfg(feature = "postgres-backend")]
pub use postgres_backend::PostgresStore;
pub use record::{KeyHash, Record};

/// A pluggable store of credential records.
///
/// Every operation is atomic with respect to the others for a given key.
/// Implementations must be safe to share across async tasks (`Send + Sync`).
///
/// A record is either *live* or *invalid*. Invalid records stay in the store
/// so repeated invalidation is idempotent, but they can never be read back.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Store a new record under `key`.
    ///
    /// Concurrent puts of the same key resolve with exactly one winner.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] if the key already exists, live or
    /// invalid. Returns [`StorageError::Write`] if the backend fails.
    async fn put(&self, key: &KeyHash, record: &Record) -> Result<(), StorageError>;

    /// Retrieve the live record stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Invalid`] carrying the stored reason if the
    /// record was invalidated. Returns [`StorageError::Read`] if the backend
    /// fails.
    async fn get(&self, key: &KeyHash) -> Result<Option<Record>, StorageError>;

    /// Remove the record stored under `key`. This is idempotent: deleting a
    /// non-existent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Delete`] if the backend fails.
    async fn delete(&self, key: &KeyHash) -> Result<(), StorageError>;

    /// Mark the record stored under `key` as invalid.
    ///
    /// It is not an error if the key does not exist. The reason of a record
    /// that is already invalid is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Invalidate`] if the backend fails.
    async fn invalidate(&self, key: &KeyHash, reason: &str) -> Result<(), StorageError>;
}
