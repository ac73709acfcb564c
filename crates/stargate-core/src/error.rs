//! Error types for `stargate-core`.
//!
//! Lower-level errors ([`CryptoError`], [`CodecError`], [`GrantError`]) carry
//! enough context to diagnose a failure from logs. None of them include key
//! material, plaintext, or ciphertext. [`DatabaseError`] is the single set of
//! kinds callers of the database see; backend detail is folded into
//! [`DatabaseError::Internal`].

use stargate_storage::StorageError;

/// Errors from AEAD and key derivation primitives.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// AES-256-GCM encryption failed.
    #[error("encryption failed: {reason}")]
    Encryption { reason: String },

    /// AES-256-GCM decryption failed (wrong key, corrupted ciphertext, tampered
    /// tag, or mismatched associated data).
    #[error("decryption failed")]
    Decryption,

    /// HKDF key derivation failed.
    #[error("key derivation failed for context '{context}': {reason}")]
    KeyDerivation { context: String, reason: String },

    /// Ciphertext is too short to contain a valid nonce + tag.
    #[error("ciphertext too short: expected at least {expected} bytes, got {actual}")]
    CiphertextTooShort { expected: usize, actual: usize },
}

/// Errors from the credential codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The access key id is not a valid encoding of an access key.
    #[error("malformed access key id: {reason}")]
    MalformedAccessKeyId { reason: String },

    /// A sealed field could not be opened with the given access key.
    #[error("failed to open sealed {field}")]
    Decrypt { field: &'static str },

    /// A sealed field decrypted but did not hold UTF-8 text.
    #[error("sealed {field} is not valid UTF-8")]
    Encoding { field: &'static str },

    /// A lower-level cryptographic operation failed while sealing.
    #[error("codec crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Errors from access grant inspection.
#[derive(Debug, thiserror::Error)]
pub enum GrantError {
    /// The grant was empty.
    #[error("access grant is empty")]
    Empty,

    /// The grant is not valid base58.
    #[error("access grant is not valid base58")]
    Base58,

    /// The checksum or version byte did not match.
    #[error("access grant checksum or version mismatch")]
    Checksum,

    /// The serialized scope could not be decoded.
    #[error("malformed access grant scope: {reason}")]
    Scope { reason: String },

    /// The embedded API key could not be decoded.
    #[error("malformed api key: {reason}")]
    ApiKey { reason: String },
}

/// Errors surfaced by the credential database.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// A record already exists under the generated key.
    #[error("credential already exists")]
    Conflict,

    /// No record exists for the access key.
    #[error("credential not found")]
    NotFound,

    /// The record exists but was invalidated.
    #[error("credential is invalid: {reason}")]
    Invalid { reason: String },

    /// The record could not be opened with the access key.
    #[error("credential could not be decrypted")]
    DecryptFailure,

    /// The access key id could not be parsed.
    #[error("malformed access key id")]
    MalformedAccessKeyId,

    /// The access grant could not be inspected.
    #[error("malformed access grant: {reason}")]
    MalformedGrant { reason: String },

    /// Any other backend or codec failure.
    #[error("credential database error: {reason}")]
    Internal { reason: String },
}

impl From<StorageError> for DatabaseError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { .. } => Self::Conflict,
            StorageError::Invalid { reason } => Self::Invalid { reason },
            StorageError::Open { .. }
            | StorageError::Read { .. }
            | StorageError::Write { .. }
            | StorageError::Delete { .. }
            | StorageError::Invalidate { .. } => Self::Internal {
                reason: err.to_string(),
            },
        }
    }
}

impl From<CodecError> for DatabaseError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::MalformedAccessKeyId { .. } => Self::MalformedAccessKeyId,
            CodecError::Decrypt { .. } | CodecError::Encoding { .. } => Self::DecryptFailure,
            CodecError::Crypto(_) => Self::Internal {
                reason: err.to_string(),
            },
        }
    }
}

impl From<GrantError> for DatabaseError {
    fn from(err: GrantError) -> Self {
        Self::MalformedGrant {
            reason: err.to_string(),
        }
    }
}
