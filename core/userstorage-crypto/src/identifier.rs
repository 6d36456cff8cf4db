//! Entry identifier ("hashed key") derivation.
//!
//! The remote service indexes entries by an opaque identifier instead of the
//! plaintext path:
//!
//! ```text
//! identifier_key = HMAC-SHA256(root_secret, "userstorage/entry-identifier/v1")
//! entry_id       = HMAC-SHA256(identifier_key, "feature.key")
//! ```
//!
//! Both steps are deterministic, so every device holding the same root secret
//! computes the same identifier for the same path.

use crate::error::{CryptoError, CryptoResult};
use crate::key::RootSecret;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use userstorage_schema::{Feature, StoragePath, PATH_SEPARATOR};
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Size of an entry identifier in bytes.
pub const IDENTIFIER_SIZE: usize = 32;

const IDENTIFIER_KEY_LABEL: &[u8] = b"userstorage/entry-identifier/v1";

/// Deterministic, fixed-length lookup identifier for one entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryIdentifier([u8; IDENTIFIER_SIZE]);

impl EntryIdentifier {
    /// Wraps raw identifier bytes.
    pub fn from_bytes(bytes: [u8; IDENTIFIER_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the identifier bytes.
    pub fn as_bytes(&self) -> &[u8; IDENTIFIER_SIZE] {
        &self.0
    }

    /// Lowercase hex, the form used in URLs and `HashedKey` fields.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses the 64-character hex form.
    pub fn from_hex(encoded: &str) -> CryptoResult<Self> {
        let mut bytes = [0u8; IDENTIFIER_SIZE];
        hex::decode_to_slice(encoded, &mut bytes)
            .map_err(|e| CryptoError::InvalidIdentifier(format!("{encoded}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for EntryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for EntryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryIdentifier({})", self.to_hex())
    }
}

impl FromStr for EntryIdentifier {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for EntryIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EntryIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_hex(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Key for computing entry identifiers, derived once per root secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct IdentifierKey {
    bytes: [u8; 32],
}

impl IdentifierKey {
    /// HMAC-SHA256 of a fixed label under the root secret.
    pub fn derive(secret: &RootSecret) -> CryptoResult<Self> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        mac.update(IDENTIFIER_KEY_LABEL);
        Ok(Self {
            bytes: mac.finalize().into_bytes().into(),
        })
    }

    /// Identifier for `feature.key`.
    pub fn entry_id(&self, feature: Feature, key: &str) -> CryptoResult<EntryIdentifier> {
        let mut mac = HmacSha256::new_from_slice(&self.bytes)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        mac.update(feature.as_str().as_bytes());
        let mut separator = [0u8; 4];
        mac.update(PATH_SEPARATOR.encode_utf8(&mut separator).as_bytes());
        mac.update(key.as_bytes());
        Ok(EntryIdentifier(mac.finalize().into_bytes().into()))
    }
}

impl fmt::Debug for IdentifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derives the identifier for a `feature.key` path.
///
/// Feature-only paths name a collection rather than an entry and are rejected.
pub fn derive_entry_id(path: &StoragePath, secret: &RootSecret) -> CryptoResult<EntryIdentifier> {
    let entry = path
        .expect_entry()
        .map_err(|_| CryptoError::FeatureOnlyPath(path.to_string()))?;
    IdentifierKey::derive(secret)?.entry_id(entry.feature(), entry.key())
}
