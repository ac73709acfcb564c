//! Credential codec: access keys, secret keys, and record sealing.
//!
//! An [`AccessKey`] is 16 random bytes. Everything else about a credential
//! is derived from it:
//!
//! - the **access key id** shown to users is its versioned hex encoding,
//! - the store's [`KeyHash`] is `SHA-256(key)`,
//! - the record key sealing both secret fields comes from HKDF-SHA256.
//!
//! The store only ever sees the hash, so a dump of the store yields nothing
//! that can open a record. Whoever presents the access key id can open it.
//!
//! The S3 [`SecretKey`] is independent randomness. It is sealed inside the
//! record and checked by the gateway when signing requests; reading the grant
//! back never requires it.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use stargate_storage::{KeyHash, Record};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::{self, EncryptionKey};
use crate::error::CodecError;

/// Raw access key length in bytes.
const ACCESS_KEY_LEN: usize = 16;

/// Raw secret key length in bytes.
const SECRET_KEY_LEN: usize = 32;

/// Leading byte of every encoded access key id.
const ACCESS_KEY_VERSION: u8 = 1;

/// HKDF salt for record keys.
const RECORD_KEY_SALT: &[u8] = b"stargate-access-key";

/// HKDF info for record keys.
const RECORD_KEY_INFO: &[u8] = b"stargate-record-v1";

const SECRET_KEY_AAD: &[u8] = b"stargate:secret_key";
const ACCESS_GRANT_AAD: &[u8] = b"stargate:access_grant";

/// The random secret from which an access key id, its store key, and its
/// record key are all derived.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessKey([u8; ACCESS_KEY_LEN]);

impl AccessKey {
    /// Sample a fresh access key from the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; ACCESS_KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parse an access key id produced by [`access_key_id`](Self::access_key_id).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MalformedAccessKeyId`] if `id` is not lowercase
    /// hex, has the wrong length, or carries an unknown version byte.
    pub fn from_access_key_id(id: &str) -> Result<Self, CodecError> {
        // Only the lowercase form is canonical.
        if !id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(CodecError::MalformedAccessKeyId {
                reason: "not lowercase hex".to_owned(),
            });
        }
        let decoded = Zeroizing::new(hex::decode(id).map_err(|e| {
            CodecError::MalformedAccessKeyId {
                reason: e.to_string(),
            }
        })?);

        let Some((&version, key)) = decoded.split_first() else {
            return Err(CodecError::MalformedAccessKeyId {
                reason: "empty".to_owned(),
            });
        };
        if version != ACCESS_KEY_VERSION {
            return Err(CodecError::MalformedAccessKeyId {
                reason: format!("unknown version {version}"),
            });
        }

        let bytes: [u8; ACCESS_KEY_LEN] =
            key.try_into()
                .map_err(|_| CodecError::MalformedAccessKeyId {
                    reason: format!("expected {ACCESS_KEY_LEN} key bytes, got {}", key.len()),
                })?;
        Ok(Self(bytes))
    }

    /// The public identifier handed to S3 clients, safe for URL paths.
    #[must_use]
    pub fn access_key_id(&self) -> String {
        let mut raw = Zeroizing::new(Vec::with_capacity(ACCESS_KEY_LEN + 1));
        raw.push(ACCESS_KEY_VERSION);
        raw.extend_from_slice(&self.0);
        hex::encode(raw.as_slice())
    }

    /// The store key for this access key. One-way.
    #[must_use]
    pub fn hash(&self) -> KeyHash {
        KeyHash::from_bytes(Sha256::digest(self.0).into())
    }

    /// Derive the key that seals this access key's record.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Crypto`] if HKDF expansion fails.
    pub fn record_key(&self) -> Result<EncryptionKey, CodecError> {
        Ok(crypto::derive_key(&self.0, RECORD_KEY_SALT, RECORD_KEY_INFO)?)
    }
}

impl PartialEq for AccessKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for AccessKey {}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessKey(hash={})", self.hash())
    }
}

/// The S3 secret key returned to the caller alongside the access key id.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(String);

impl SecretKey {
    /// Generate a fresh secret key: 32 random bytes, hex-encoded.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; SECRET_KEY_LEN]);
        OsRng.fill_bytes(bytes.as_mut_slice());
        Self(hex::encode(bytes.as_slice()))
    }

    /// Borrow the secret key text.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for SecretKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

/// Ciphertext for the two secret fields of a [`Record`].
#[derive(Debug, Clone)]
pub struct SealedFields {
    pub encrypted_secret_key: Vec<u8>,
    pub encrypted_access_grant: Vec<u8>,
}

/// Plaintext recovered from a [`Record`].
pub struct OpenedFields {
    pub access_grant: Zeroizing<String>,
    pub secret_key: SecretKey,
}

/// Seal an access grant and secret key under `access_key`'s record key.
///
/// # Errors
///
/// Returns [`CodecError::Crypto`] if key derivation or encryption fails.
pub fn seal(
    access_key: &AccessKey,
    access_grant: &str,
    secret_key: &SecretKey,
) -> Result<SealedFields, CodecError> {
    let key = access_key.record_key()?;
    Ok(SealedFields {
        encrypted_secret_key: crypto::encrypt(&key, secret_key.expose().as_bytes(), SECRET_KEY_AAD)?,
        encrypted_access_grant: crypto::encrypt(&key, access_grant.as_bytes(), ACCESS_GRANT_AAD)?,
    })
}

/// Open both secret fields of `record` with `access_key`.
///
/// # Errors
///
/// Returns [`CodecError::Decrypt`] if either field fails authentication under
/// this access key, and [`CodecError::Encoding`] if a field is not UTF-8.
pub fn open(access_key: &AccessKey, record: &Record) -> Result<OpenedFields, CodecError> {
    let key = access_key.record_key()?;
    let secret_key = open_text(&key, &record.encrypted_secret_key, SECRET_KEY_AAD, "secret key")?;
    let access_grant = open_text(
        &key,
        &record.encrypted_access_grant,
        ACCESS_GRANT_AAD,
        "access grant",
    )?;
    Ok(OpenedFields {
        access_grant,
        secret_key: SecretKey(secret_key.to_string()),
    })
}

fn open_text(
    key: &EncryptionKey,
    ciphertext: &[u8],
    aad: &[u8],
    field: &'static str,
) -> Result<Zeroizing<String>, CodecError> {
    let plaintext = crypto::decrypt(key, ciphertext, aad).map_err(|_| CodecError::Decrypt { field })?;
    String::from_utf8(plaintext)
        .map(Zeroizing::new)
        .map_err(|_| CodecError::Encoding { field })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const GRANT: &str = "138CV9Drxrw8ir1XpxcZhk2wnHjhzVjuSZe6yDsNiMZDP8cow9V6sHDYdwgvYoQGgqVvoMnxdWDbpBiEPW5oP7DtPJ5sZx2MVxFrUoZYFfVAgxidW";

    fn record(sealed: SealedFields, public: bool) -> Record {
        Record {
            satellite_address: "sat".to_owned(),
            macaroon_head: vec![0; 32],
            encrypted_secret_key: sealed.encrypted_secret_key,
            encrypted_access_grant: sealed.encrypted_access_grant,
            public,
        }
    }

    #[test]
    fn access_key_id_roundtrip() {
        let key = AccessKey::generate();
        let id = key.access_key_id();
        assert_eq!(id.len(), 34);
        assert!(id.starts_with("01"));
        assert_eq!(AccessKey::from_access_key_id(&id).unwrap(), key);
    }

    #[test]
    fn access_key_id_is_url_safe() {
        let id = AccessKey::generate().access_key_id();
        assert!(id.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }

    #[test]
    fn malformed_access_key_ids_are_rejected() {
        for id in ["", "someid", "01abcd", "02000102030405060708090a0b0c0d0e0f", "zz"] {
            assert!(
                matches!(
                    AccessKey::from_access_key_id(id),
                    Err(CodecError::MalformedAccessKeyId { .. })
                ),
                "{id:?} should be rejected"
            );
        }
    }

    #[test]
    fn uppercase_access_key_id_is_rejected() {
        let id = format!("01{}", "ab".repeat(16));
        assert!(AccessKey::from_access_key_id(&id).is_ok());
        let upper = id.to_uppercase();
        assert!(matches!(
            AccessKey::from_access_key_id(&upper),
            Err(CodecError::MalformedAccessKeyId { .. })
        ));
    }

    #[test]
    fn hash_is_stable_per_key() {
        let key = AccessKey::generate();
        let parsed = AccessKey::from_access_key_id(&key.access_key_id()).unwrap();
        assert_eq!(key.hash(), parsed.hash());
    }

    #[test]
    fn generated_key_hashes_never_collide() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(AccessKey::generate().hash()));
        }
    }

    #[test]
    fn seal_open_roundtrip() {
        let key = AccessKey::generate();
        let secret = SecretKey::generate();
        let sealed = seal(&key, GRANT, &secret).unwrap();

        let opened = open(&key, &record(sealed, false)).unwrap();
        assert_eq!(opened.access_grant.as_str(), GRANT);
        assert_eq!(opened.secret_key, secret);
    }

    #[test]
    fn public_record_grant_roundtrips() {
        let key = AccessKey::generate();
        let sealed = seal(&key, GRANT, &SecretKey::generate()).unwrap();
        let opened = open(&key, &record(sealed, true)).unwrap();
        assert_eq!(opened.access_grant.as_str(), GRANT);
    }

    #[test]
    fn open_with_other_key_fails() {
        let sealed = seal(&AccessKey::generate(), GRANT, &SecretKey::generate()).unwrap();
        let result = open(&AccessKey::generate(), &record(sealed, false));
        assert!(matches!(result, Err(CodecError::Decrypt { .. })));
    }

    #[test]
    fn open_tampered_grant_fails() {
        let key = AccessKey::generate();
        let mut sealed = seal(&key, GRANT, &SecretKey::generate()).unwrap();
        if let Some(byte) = sealed.encrypted_access_grant.get_mut(20) {
            *byte ^= 0x80;
        }
        let result = open(&key, &record(sealed, false));
        assert!(matches!(
            result,
            Err(CodecError::Decrypt {
                field: "access grant"
            })
        ));
    }

    #[test]
    fn swapped_fields_fail() {
        let key = AccessKey::generate();
        let sealed = seal(&key, GRANT, &SecretKey::generate()).unwrap();
        let swapped = SealedFields {
            encrypted_secret_key: sealed.encrypted_access_grant,
            encrypted_access_grant: sealed.encrypted_secret_key,
        };
        assert!(matches!(
            open(&key, &record(swapped, false)),
            Err(CodecError::Decrypt { .. })
        ));
    }

    #[test]
    fn secret_keys_are_distinct_hex() {
        let a = SecretKey::generate();
        let b = SecretKey::generate();
        assert_eq!(a.expose().len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let key = AccessKey::generate();
        let debug = format!("{key:?}");
        assert!(!debug.contains(&key.access_key_id()[2..]));
        assert_eq!(format!("{:?}", SecretKey::generate()), "SecretKey([REDACTED])");
    }
}
