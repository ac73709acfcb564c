//! The persisted credential record and its store key.

use std::fmt;

/// One persisted credential binding.
///
/// Both secret fields are ciphertext. Nothing here is enough on its own to
/// recover the access grant.
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    /// Address of the satellite that issued the underlying grant.
    pub satellite_address: String,
    /// Opaque 32-byte fingerprint of the grant's API key, kept for
    /// correlation only.
    pub macaroon_head: Vec<u8>,
    /// The S3 secret key, sealed with the access key's record key.
    pub encrypted_secret_key: Vec<u8>,
    /// The original access grant, sealed the same way.
    pub encrypted_access_grant: Vec<u8>,
    /// If true, knowledge of the secret key is not required.
    pub public: bool,
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("satellite_address", &self.satellite_address)
            .field("macaroon_head", &hex::encode(&self.macaroon_head))
            .field("encrypted_secret_key", &self.encrypted_secret_key.len())
            .field("encrypted_access_grant", &self.encrypted_access_grant.len())
            .field("public", &self.public)
            .finish()
    }
}

/// The key portion of the record store: `SHA-256` of an access key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyHash([u8; 32]);

impl KeyHash {
    /// Wrap raw hash bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw hash bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyHash({self})")
    }
}
