//! In-memory record store.
//!
//! All records live in a `BTreeMap` behind a `RwLock`. Nothing is persisted;
//! all data is lost when the process exits. Every operation takes the lock
//! exactly once, which makes each one atomic with respect to the others.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{KeyHash, Record, RecordStore, StorageError};

#[derive(Debug, Clone)]
struct Entry {
    record: Record,
    invalid_reason: Option<String>,
}

/// An in-memory record store backed by a `BTreeMap`.
///
/// Thread-safe and async-compatible. Clones share the same underlying map.
///
/// # Examples
///
/// ```
/// # use stargate_storage::{KeyHash, MemoryStore, Record, RecordStore};
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryStore::new();
/// let key = KeyHash::from_bytes([7; 32]);
/// let record = Record {
///     satellite_address: "us1.example.io:7777".to_owned(),
///     macaroon_head: vec![0; 32],
///     encrypted_secret_key: vec![1, 2, 3],
///     encrypted_access_grant: vec![4, 5, 6],
///     public: false,
/// };
/// store.put(&key, &record).await.unwrap();
/// assert_eq!(store.get(&key).await.unwrap(), Some(record));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<KeyHash, Entry>>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, live and invalid.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no records at all.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn put(&self, key: &KeyHash, record: &Record) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(key) {
            return Err(StorageError::Conflict {
                key: key.to_string(),
            });
        }
        entries.insert(
            *key,
            Entry {
                record: record.clone(),
                invalid_reason: None,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &KeyHash) -> Result<Option<Record>, StorageError> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            None => Ok(None),
            Some(Entry {
                invalid_reason: Some(reason),
                ..
            }) => Err(StorageError::Invalid {
                reason: reason.clone(),
            }),
            Some(entry) => Ok(Some(entry.record.clone())),
        }
    }

    async fn delete(&self, key: &KeyHash) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn invalidate(&self, key: &KeyHash, reason: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.invalid_reason.get_or_insert_with(|| reason.to_owned());
        }
        Ok(())
    }
}
