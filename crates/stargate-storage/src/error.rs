//! Storage error types.
//!
//! Backend variants carry the key hash and the backend's own message so a
//! failure can be diagnosed from logs. They never carry record contents.

/// Errors that can occur during record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A record already exists under the key.
    #[error("record already exists for key '{key}'")]
    Conflict { key: String },

    /// The record exists but was invalidated.
    #[error("record is invalid: {reason}")]
    Invalid { reason: String },

    /// Failed to open or connect to the storage backend.
    #[error("failed to open storage at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Failed to read a record.
    #[error("failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },

    /// Failed to write a record.
    #[error("failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },

    /// Failed to delete a record.
    #[error("failed to delete key '{key}': {reason}")]
    Delete { key: String, reason: String },

    /// Failed to invalidate a record.
    #[error("failed to invalidate key '{key}': {reason}")]
    Invalidate { key: String, reason: String },
}
