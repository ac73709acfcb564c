//! Access grant inspection.
//!
//! An access grant is treated as an opaque capability. The only things read
//! out of it are the satellite address and the macaroon head of its API key,
//! both stored next to the sealed grant for correlation.
//!
//! Wire layout:
//!
//! ```text
//! base58( 0x00 || scope || sha256(sha256(0x00 || scope))[..4] )
//!
//! scope   = protobuf { 1: satellite_addr (string), 2: api_key (bytes), 3: encryption_access }
//! api_key = 0x02 || [0x01 varint(len) location] || 0x02 varint(len) head || ...
//! ```

use std::fmt;

use base58::FromBase58;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::GrantError;

const GRANT_VERSION: u8 = 0;
const CHECKSUM_LEN: usize = 4;
const MACAROON_VERSION: u8 = 2;

const SCOPE_SATELLITE_ADDR: u64 = 1;
const SCOPE_API_KEY: u64 = 2;

const MACAROON_LOCATION: u8 = 1;
const MACAROON_IDENTIFIER: u8 = 2;
const MACAROON_HEAD_LEN: usize = 32;

/// A parsed, still-opaque access grant.
pub struct AccessGrant {
    serialized: Zeroizing<String>,
    satellite_address: String,
    macaroon_head: Vec<u8>,
}

impl AccessGrant {
    /// Parse a serialized access grant.
    ///
    /// # Errors
    ///
    /// Returns a [`GrantError`] describing the first structural problem found.
    pub fn parse(serialized: &str) -> Result<Self, GrantError> {
        if serialized.is_empty() {
            return Err(GrantError::Empty);
        }

        let decoded = Zeroizing::new(serialized.from_base58().map_err(|_| GrantError::Base58)?);
        let Some(split) = decoded.len().checked_sub(CHECKSUM_LEN) else {
            return Err(GrantError::Checksum);
        };
        let (payload, checksum) = decoded.split_at(split);
        let expected = Sha256::digest(Sha256::digest(payload));
        if expected.get(..CHECKSUM_LEN) != Some(checksum) {
            return Err(GrantError::Checksum);
        }
        let Some((&GRANT_VERSION, scope)) = payload.split_first() else {
            return Err(GrantError::Checksum);
        };

        let (satellite_address, api_key) = parse_scope(scope)?;
        let macaroon_head = parse_macaroon_head(api_key)?;

        Ok(Self {
            serialized: Zeroizing::new(serialized.to_owned()),
            satellite_address,
            macaroon_head,
        })
    }

    /// The grant exactly as it was supplied.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// Address of the satellite that issued the grant.
    #[must_use]
    pub fn satellite_address(&self) -> &str {
        &self.satellite_address
    }

    /// The 32-byte identifier of the grant's API key macaroon.
    #[must_use]
    pub fn macaroon_head(&self) -> &[u8] {
        &self.macaroon_head
    }
}

impl fmt::Debug for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGrant")
            .field("satellite_address", &self.satellite_address)
            .field("macaroon_head", &hex::encode(&self.macaroon_head))
            .finish_non_exhaustive()
    }
}

/// Walk the protobuf scope, returning the satellite address and API key.
fn parse_scope(mut scope: &[u8]) -> Result<(String, &[u8]), GrantError> {
    let mut satellite_address = None;
    let mut api_key = None;

    while !scope.is_empty() {
        let tag = read_varint(&mut scope).ok_or_else(|| scope_error("truncated tag"))?;
        let field = tag >> 3;
        match tag & 0x7 {
            0 => {
                read_varint(&mut scope).ok_or_else(|| scope_error("truncated varint"))?;
            }
            1 => {
                take(&mut scope, 8).ok_or_else(|| scope_error("truncated fixed64"))?;
            }
            2 => {
                let len = read_varint(&mut scope).ok_or_else(|| scope_error("truncated length"))?;
                let len = usize::try_from(len).map_err(|_| scope_error("field too long"))?;
                let value = take(&mut scope, len).ok_or_else(|| scope_error("truncated field"))?;
                match field {
                    SCOPE_SATELLITE_ADDR => {
                        let addr = std::str::from_utf8(value)
                            .map_err(|_| scope_error("satellite address is not UTF-8"))?;
                        satellite_address = Some(addr.to_owned());
                    }
                    SCOPE_API_KEY => api_key = Some(value),
                    _ => {}
                }
            }
            5 => {
                take(&mut scope, 4).ok_or_else(|| scope_error("truncated fixed32"))?;
            }
            wire => return Err(scope_error(&format!("unsupported wire type {wire}"))),
        }
    }

    let satellite_address = satellite_address
        .filter(|addr| !addr.is_empty())
        .ok_or_else(|| scope_error("missing satellite address"))?;
    let api_key = api_key.ok_or_else(|| scope_error("missing api key"))?;
    Ok((satellite_address, api_key))
}

/// Read the identifier packet from a serialized macaroon.
fn parse_macaroon_head(mut api_key: &[u8]) -> Result<Vec<u8>, GrantError> {
    match take(&mut api_key, 1) {
        Some([MACAROON_VERSION]) => {}
        Some(_) => return Err(api_key_error("unsupported macaroon version")),
        None => return Err(api_key_error("empty")),
    }

    let mut field = take(&mut api_key, 1).ok_or_else(|| api_key_error("truncated"))?;
    if field == [MACAROON_LOCATION] {
        read_packet(&mut api_key).ok_or_else(|| api_key_error("truncated location"))?;
        field = take(&mut api_key, 1).ok_or_else(|| api_key_error("truncated"))?;
    }
    if field != [MACAROON_IDENTIFIER] {
        return Err(api_key_error("missing identifier"));
    }

    let head = read_packet(&mut api_key).ok_or_else(|| api_key_error("truncated identifier"))?;
    if head.len() != MACAROON_HEAD_LEN {
        return Err(api_key_error(&format!(
            "identifier is {} bytes, expected {MACAROON_HEAD_LEN}",
            head.len()
        )));
    }
    Ok(head.to_vec())
}

fn read_packet<'a>(buf: &mut &'a [u8]) -> Option<&'a [u8]> {
    let len = usize::try_from(read_varint(buf)?).ok()?;
    take(buf, len)
}

fn read_varint(buf: &mut &[u8]) -> Option<u64> {
    let mut value = 0u64;
    for shift in (0..64).step_by(7) {
        let (&byte, rest) = buf.split_first()?;
        *buf = rest;
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Some(value);
        }
    }
    None
}

fn take<'a>(buf: &mut &'a [u8], n: usize) -> Option<&'a [u8]> {
    if buf.len() < n {
        return None;
    }
    let (head, rest) = buf.split_at(n);
    *buf = rest;
    Some(head)
}

fn scope_error(reason: &str) -> GrantError {
    GrantError::Scope {
        reason: reason.to_owned(),
    }
}

fn api_key_error(reason: &str) -> GrantError {
    GrantError::ApiKey {
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use base58::ToBase58;

    use super::*;

    const MINIMAL_ACCESS: &str = "138CV9Drxrw8ir1XpxcZhk2wnHjhzVjuSZe6yDsNiMZDP8cow9V6sHDYdwgvYoQGgqVvoMnxdWDbpBiEPW5oP7DtPJ5sZx2MVxFrUoZYFfVAgxidW";

    /// Serialize a scope the way a satellite would.
    fn encode(scope: &[u8]) -> String {
        let mut payload = vec![GRANT_VERSION];
        payload.extend_from_slice(scope);
        let checksum = Sha256::digest(Sha256::digest(&payload));
        payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);
        payload.to_base58()
    }

    fn scope(satellite: &[u8], api_key: &[u8]) -> Vec<u8> {
        let mut scope = vec![0x0a, u8::try_from(satellite.len()).unwrap()];
        scope.extend_from_slice(satellite);
        scope.extend_from_slice(&[0x12, u8::try_from(api_key.len()).unwrap()]);
        scope.extend_from_slice(api_key);
        scope.extend_from_slice(&[0x1a, 0x00]);
        scope
    }

    #[test]
    fn parses_reference_grant() {
        let grant = AccessGrant::parse(MINIMAL_ACCESS).unwrap();
        assert_eq!(grant.satellite_address(), "s");
        assert_eq!(
            hex::encode(grant.macaroon_head()),
            "4dff5d8e6b3506be68cf76b480ab1261ac391fe5a2f7db66d1293d68109f3665"
        );
        assert_eq!(grant.as_str(), MINIMAL_ACCESS);
    }

    #[test]
    fn parses_macaroon_with_location() {
        let mut api_key = vec![MACAROON_VERSION, MACAROON_LOCATION, 3];
        api_key.extend_from_slice(b"loc");
        api_key.extend_from_slice(&[MACAROON_IDENTIFIER, 32]);
        api_key.extend_from_slice(&[7; 32]);
        api_key.extend_from_slice(&[0, 0]);

        let grant = AccessGrant::parse(&encode(&scope(b"us1.example.io:7777", &api_key))).unwrap();
        assert_eq!(grant.satellite_address(), "us1.example.io:7777");
        assert_eq!(grant.macaroon_head(), [7; 32].as_slice());
    }

    #[test]
    fn skips_unknown_scope_fields() {
        let mut api_key = vec![MACAROON_VERSION, MACAROON_IDENTIFIER, 32];
        api_key.extend_from_slice(&[1; 32]);
        let mut raw = vec![0x20, 0x96, 0x01];
        raw.extend_from_slice(&scope(b"sat", &api_key));

        let grant = AccessGrant::parse(&encode(&raw)).unwrap();
        assert_eq!(grant.satellite_address(), "sat");
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(AccessGrant::parse(""), Err(GrantError::Empty)));
    }

    #[test]
    fn rejects_non_base58() {
        assert!(matches!(
            AccessGrant::parse("0OIl-not-base58"),
            Err(GrantError::Base58)
        ));
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut encoded = vec![GRANT_VERSION];
        encoded.extend_from_slice(&scope(b"s", &[MACAROON_VERSION]));
        encoded.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            AccessGrant::parse(&encoded.to_base58()),
            Err(GrantError::Checksum)
        ));
    }

    #[test]
    fn rejects_short_input() {
        assert!(matches!(AccessGrant::parse("1"), Err(GrantError::Checksum)));
    }

    #[test]
    fn rejects_missing_api_key() {
        let raw = [0x0a, 0x01, b's'];
        assert!(matches!(
            AccessGrant::parse(&encode(&raw)),
            Err(GrantError::Scope { .. })
        ));
    }

    #[test]
    fn rejects_missing_satellite() {
        let raw = [0x12, 0x03, MACAROON_VERSION, MACAROON_IDENTIFIER, 0x00];
        assert!(matches!(
            AccessGrant::parse(&encode(&raw)),
            Err(GrantError::Scope { .. })
        ));
    }

    #[test]
    fn rejects_unknown_macaroon_version() {
        let api_key = [9, MACAROON_IDENTIFIER, 1, 0xff];
        assert!(matches!(
            AccessGrant::parse(&encode(&scope(b"s", &api_key))),
            Err(GrantError::ApiKey { .. })
        ));
    }

    #[test]
    fn rejects_truncated_identifier() {
        let api_key = [MACAROON_VERSION, MACAROON_IDENTIFIER, 32, 1, 2, 3];
        assert!(matches!(
            AccessGrant::parse(&encode(&scope(b"s", &api_key))),
            Err(GrantError::ApiKey { .. })
        ));
    }

    #[test]
    fn rejects_short_identifier() {
        let mut api_key = vec![MACAROON_VERSION, MACAROON_IDENTIFIER, 16];
        api_key.extend_from_slice(&[5; 16]);
        assert!(matches!(
            AccessGrant::parse(&encode(&scope(b"s", &api_key))),
            Err(GrantError::ApiKey { .. })
        ));
    }

    #[test]
    fn debug_does_not_print_grant() {
        let grant = AccessGrant::parse(MINIMAL_ACCESS).unwrap();
        assert!(!format!("{grant:?}").contains(MINIMAL_ACCESS));
    }
}
