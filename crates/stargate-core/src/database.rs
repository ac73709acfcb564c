//! Credential database.
//!
//! The [`Database`] is the one seam the HTTP layer and the gateway depend on,
//! whatever [`RecordStore`] backs it. The keyed operations (`put_record`,
//! `get_record`, `delete`, `invalidate`) pass straight through to the store;
//! the domain operations (`register`, `resolve`, and the `_by_id` variants)
//! add the credential codec on top.
//!
//! Every store and codec error leaves this module as a [`DatabaseError`].

use std::sync::Arc;

use stargate_storage::{KeyHash, Record, RecordStore};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::credentials::{self, AccessKey, SecretKey};
use crate::error::DatabaseError;
use crate::grant::AccessGrant;

/// A newly issued credential pair.
#[derive(Debug)]
pub struct Registration {
    /// Public identifier for S3 clients.
    pub access_key_id: String,
    /// S3 secret key, returned only at registration.
    pub secret_key: SecretKey,
}

/// A credential resolved back to its grant.
pub struct Resolved {
    /// The original access grant.
    pub access_grant: Zeroizing<String>,
    /// The S3 secret key issued with the grant.
    pub secret_key: SecretKey,
    /// Whether the secret key is required to use the credential.
    pub public: bool,
}

/// Stores and resolves credentials on top of a [`RecordStore`].
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn RecordStore>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Create a database over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Store `record` under `key_hash`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Conflict`] if the key exists, or
    /// [`DatabaseError::Internal`] if the store fails.
    pub async fn put_record(&self, key_hash: &KeyHash, record: &Record) -> Result<(), DatabaseError> {
        Ok(self.store.put(key_hash, record).await?)
    }

    /// Fetch the live record under `key_hash`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Invalid`] if the record was invalidated, or
    /// [`DatabaseError::Internal`] if the store fails.
    pub async fn get_record(&self, key_hash: &KeyHash) -> Result<Option<Record>, DatabaseError> {
        Ok(self.store.get(key_hash).await?)
    }

    /// Remove the record under `key_hash`. Absent keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Internal`] if the store fails.
    pub async fn delete(&self, key_hash: &KeyHash) -> Result<(), DatabaseError> {
        Ok(self.store.delete(key_hash).await?)
    }

    /// Mark the record under `key_hash` invalid. Absent keys are not an error,
    /// and the first reason recorded is kept.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Internal`] if the store fails.
    pub async fn invalidate(&self, key_hash: &KeyHash, reason: &str) -> Result<(), DatabaseError> {
        Ok(self.store.invalidate(key_hash, reason).await?)
    }

    /// Issue a new credential pair for `access_grant`.
    ///
    /// # Errors
    ///
    /// - [`DatabaseError::MalformedGrant`] if the grant cannot be inspected.
    /// - [`DatabaseError::Conflict`] if the generated key already exists.
    /// - [`DatabaseError::Internal`] if sealing or the store fails.
    pub async fn register(&self, access_grant: &str, public: bool) -> Result<Registration, DatabaseError> {
        let grant = AccessGrant::parse(access_grant)?;

        let access_key = AccessKey::generate();
        let secret_key = SecretKey::generate();
        let sealed = credentials::seal(&access_key, grant.as_str(), &secret_key)?;
        let key_hash = access_key.hash();

        let record = Record {
            satellite_address: grant.satellite_address().to_owned(),
            macaroon_head: grant.macaroon_head().to_vec(),
            encrypted_secret_key: sealed.encrypted_secret_key,
            encrypted_access_grant: sealed.encrypted_access_grant,
            public,
        };
        self.put_record(&key_hash, &record).await?;

        info!(
            key_hash = %key_hash,
            satellite = %record.satellite_address,
            public,
            "credential registered"
        );

        Ok(Registration {
            access_key_id: access_key.access_key_id(),
            secret_key,
        })
    }

    /// Resolve an access key id back to its grant.
    ///
    /// # Errors
    ///
    /// - [`DatabaseError::MalformedAccessKeyId`] if the id cannot be parsed.
    /// - [`DatabaseError::NotFound`] if no record exists.
    /// - [`DatabaseError::Invalid`] if the record was invalidated.
    /// - [`DatabaseError::DecryptFailure`] if the record cannot be opened.
    /// - [`DatabaseError::Internal`] if the store fails.
    pub async fn resolve(&self, access_key_id: &str) -> Result<Resolved, DatabaseError> {
        let access_key = AccessKey::from_access_key_id(access_key_id)?;
        let key_hash = access_key.hash();

        let record = self
            .get_record(&key_hash)
            .await?
            .ok_or(DatabaseError::NotFound)?;
        let opened = credentials::open(&access_key, &record)?;

        debug!(key_hash = %key_hash, public = record.public, "credential resolved");

        Ok(Resolved {
            access_grant: opened.access_grant,
            secret_key: opened.secret_key,
            public: record.public,
        })
    }

    /// Delete the credential identified by `access_key_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::MalformedAccessKeyId`] if the id cannot be
    /// parsed, or [`DatabaseError::Internal`] if the store fails.
    pub async fn delete_by_id(&self, access_key_id: &str) -> Result<(), DatabaseError> {
        let key_hash = AccessKey::from_access_key_id(access_key_id)?.hash();
        self.delete(&key_hash).await?;
        info!(key_hash = %key_hash, "credential deleted");
        Ok(())
    }

    /// Invalidate the credential identified by `access_key_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::MalformedAccessKeyId`] if the id cannot be
    /// parsed, or [`DatabaseError::Internal`] if the store fails.
    pub async fn invalidate_by_id(&self, access_key_id: &str, reason: &str) -> Result<(), DatabaseError> {
        let key_hash = AccessKey::from_access_key_id(access_key_id)?.hash();
        self.invalidate(&key_hash, reason).await?;
        info!(key_hash = %key_hash, reason, "credential invalidated");
        Ok(())
    }
}
