//! Root secret handling and key derivation.
//!
//! Uses Argon2id for deriving the payload encryption key from the caller's
//! root secret.

use crate::error::{CryptoError, CryptoResult};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Payload key length.
pub const KEY_SIZE: usize = 32;

/// Argon2 salt length, also the `saltLen` recorded in every envelope.
pub const SALT_SIZE: usize = 16;

/// Salt used for every newly written blob.
///
/// A fixed salt means one Argon2 derivation per root secret, after which the
/// key is served from the [`KeyCache`](crate::KeyCache). Blobs carrying any
/// other salt still decrypt but are considered stale.
pub const SHARED_SALT: [u8; SALT_SIZE] = *b"userstorage-v1\x00\x01";

/// Caller-owned secret material from which every other key is derived.
///
/// Never persisted by this crate. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RootSecret {
    bytes: Vec<u8>,
}

impl RootSecret {
    /// Wraps caller-supplied secret bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Returns the secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// A one-way digest identifying this secret inside in-memory caches.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"userstorage/secret-fingerprint/v1");
        hasher.update(&self.bytes);
        hasher.finalize().into()
    }
}

impl From<&str> for RootSecret {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<String> for RootSecret {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

impl std::fmt::Debug for RootSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootSecret")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Argon2id output used as the ChaCha20-Poly1305 key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    /// Wraps raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Argon2 salt carried at the front of a blob's data.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Salt {
    bytes: [u8; SALT_SIZE],
}

impl Salt {
    /// A fresh salt. Blobs written with one are stale by construction.
    pub fn random() -> Self {
        let mut salt = Self {
            bytes: [0u8; SALT_SIZE],
        };
        OsRng.fill_bytes(&mut salt.bytes);
        salt
    }

    /// The salt used for newly written blobs.
    pub fn shared() -> Self {
        Self {
            bytes: SHARED_SALT,
        }
    }

    /// Wraps salt bytes read from a blob.
    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.bytes
    }

    /// True for [`SHARED_SALT`].
    pub fn is_shared(&self) -> bool {
        self.bytes == SHARED_SALT
    }
}

/// Argon2id cost settings.
///
/// Serialized with the short field names used inside blob envelopes
/// (`m`, `t`, `p`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KdfParams {
    /// KiB.
    #[serde(rename = "m")]
    pub memory_cost: u32,
    /// Passes over memory.
    #[serde(rename = "t")]
    pub time_cost: u32,
    /// Lanes.
    #[serde(rename = "p")]
    pub parallelism: u32,
}

/// Upper bounds accepted from stored envelopes: four times the default cost.
const MAX_MEMORY_COST: u32 = 4 * 19 * 1024;
const MAX_TIME_COST: u32 = 8;
const MAX_PARALLELISM: u32 = 4;

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Rejects parameters read from remote data that Argon2 would refuse or
    /// that would be unreasonably expensive to honour.
    pub fn check_bounds(&self) -> CryptoResult<()> {
        let out_of_range = || {
            CryptoError::InvalidBlob(format!(
                "kdf parameters out of range: m={} t={} p={}",
                self.memory_cost, self.time_cost, self.parallelism
            ))
        };
        if self.memory_cost > MAX_MEMORY_COST
            || self.time_cost > MAX_TIME_COST
            || self.parallelism > MAX_PARALLELISM
        {
            return Err(out_of_range());
        }
        Params::new(self.memory_cost, self.time_cost, self.parallelism, Some(KEY_SIZE))
            .map_err(|_| out_of_range())?;
        Ok(())
    }
}

/// Argon2id over the root secret. Costs are checked by `argon2` itself, so
/// out-of-range parameters surface as [`CryptoError::KeyDerivation`]; stored
/// envelopes are screened earlier by [`KdfParams::check_bounds`].
pub fn derive_key(secret: &RootSecret, salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
    let kdf_error = |e: argon2::Error| CryptoError::KeyDerivation(e.to_string());
    let cost = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(kdf_error)?;

    let mut output = [0u8; KEY_SIZE];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, cost)
        .hash_password_into(secret.as_bytes(), salt.as_bytes(), &mut output)
        .map_err(kdf_error)?;

    let key = DerivedKey::from_bytes(output);
    output.zeroize();
    Ok(key)
}
