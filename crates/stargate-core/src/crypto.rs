//! AEAD primitives for record sealing.
//!
//! Provides AES-256-GCM authenticated encryption with associated data,
//! HKDF-SHA256 key derivation, and a zeroize-on-drop key newtype.
//!
//! # Security model
//!
//! - Every encryption generates a fresh 96-bit nonce via `OsRng`.
//! - Ciphertext format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! - The associated data is authenticated but not stored; decryption must
//!   supply the same bytes or it fails.
//! - Key types derive `Zeroize` + `ZeroizeOnDrop` and redact `Debug`.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Nonce length for AES-256-GCM (96 bits).
const NONCE_LEN: usize = 12;

/// Minimum ciphertext length: nonce + 16-byte AES-GCM tag.
const MIN_CIPHERTEXT_LEN: usize = NONCE_LEN + 16;

/// A 256-bit AES key that is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Create a key from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// Encrypt `plaintext` under `key`, binding `aad` into the tag.
///
/// Returns `nonce || ciphertext || tag`.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if the AEAD operation fails.
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CryptoError::Encryption {
            reason: e.to_string(),
        })?;

    let mut combined = Vec::with_capacity(NONCE_LEN.saturating_add(sealed.len()));
    combined.extend_from_slice(&nonce);
    combined.extend_from_slice(&sealed);
    Ok(combined)
}

/// Decrypt a value produced by [`encrypt`] with the same `key` and `aad`.
///
/// # Errors
///
/// Returns [`CryptoError::CiphertextTooShort`] if the input cannot hold a
/// nonce and tag, and [`CryptoError::Decryption`] if authentication fails.
pub fn decrypt(key: &EncryptionKey, combined: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if combined.len() < MIN_CIPHERTEXT_LEN {
        return Err(CryptoError::CiphertextTooShort {
            expected: MIN_CIPHERTEXT_LEN,
            actual: combined.len(),
        });
    }

    let (nonce_bytes, sealed) = combined.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), Payload { msg: sealed, aad })
        .map_err(|_| CryptoError::Decryption)
}

/// Derive a 256-bit key from input keying material with HKDF-SHA256.
///
/// # Errors
///
/// Returns [`CryptoError::KeyDerivation`] if HKDF expansion fails, which only
/// happens for oversized outputs.
pub fn derive_key(ikm: &[u8], salt: &[u8], info: &[u8]) -> Result<EncryptionKey, CryptoError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut derived = [0u8; 32];
    hk.expand(info, &mut derived)
        .map_err(|e| CryptoError::KeyDerivation {
            context: String::from_utf8_lossy(info).into_owned(),
            reason: e.to_string(),
        })?;
    Ok(EncryptionKey::from_bytes(derived))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn key(byte: u8) -> EncryptionKey {
        EncryptionKey::from_bytes([byte; 32])
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let ciphertext = encrypt(&key(1), b"grant bytes", b"field").unwrap();
        let plaintext = decrypt(&key(1), &ciphertext, b"field").unwrap();
        assert_eq!(plaintext, b"grant bytes");
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let ciphertext = encrypt(&key(1), b"", b"field").unwrap();
        assert_eq!(ciphertext.len(), MIN_CIPHERTEXT_LEN);
        assert!(decrypt(&key(1), &ciphertext, b"field").unwrap().is_empty());
    }

    #[test]
    fn wrong_key_fails() {
        let ciphertext = encrypt(&key(1), b"secret", b"field").unwrap();
        let result = decrypt(&key(2), &ciphertext, b"field");
        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn wrong_associated_data_fails() {
        let ciphertext = encrypt(&key(1), b"secret", b"secret_key").unwrap();
        let result = decrypt(&key(1), &ciphertext, b"access_grant");
        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn too_short_fails() {
        let result = decrypt(&key(1), &[0u8; 10], b"");
        assert!(matches!(
            result,
            Err(CryptoError::CiphertextTooShort {
                expected: 28,
                actual: 10
            })
        ));
    }

    #[test]
    fn tampered_tag_fails() {
        let mut ciphertext = encrypt(&key(1), b"secret", b"").unwrap();
        if let Some(last) = ciphertext.last_mut() {
            *last ^= 0x01;
        }
        assert!(matches!(
            decrypt(&key(1), &ciphertext, b""),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn fresh_nonce_per_encryption() {
        let a = encrypt(&key(1), b"same", b"").unwrap();
        let b = encrypt(&key(1), b"same", b"").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn derive_key_is_deterministic_and_info_separated() {
        let a = derive_key(b"material", b"salt", b"one").unwrap();
        let b = derive_key(b"material", b"salt", b"one").unwrap();
        let c = derive_key(b"material", b"salt", b"two").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn debug_redacts_key() {
        assert_eq!(format!("{:?}", key(7)), "EncryptionKey([REDACTED])");
    }
}
