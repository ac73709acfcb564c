//! Core library for Stargate.
//!
//! Turns a long-lived access grant into a short S3-style credential pair and
//! back again. Contains the AEAD primitives, the credential codec that derives
//! store keys and record keys from an access key, grant scope inspection, and
//! the [`Database`](database::Database) that ties them to a
//! [`RecordStore`](stargate_storage::RecordStore).

pub mod credentials;
pub mod crypto;
pub mod database;
pub mod error;
pub mod grant;
