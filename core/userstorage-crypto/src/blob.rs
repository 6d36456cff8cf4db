//! Self-describing encrypted blobs.
//!
//! A blob is the string stored in a record's `Data` field. It is a JSON
//! envelope carrying everything except the root secret:
//!
//! ```json
//! {"v":"1","t":"argon2id","d":"<base64 salt||nonce||ciphertext>","o":{"m":19456,"t":2,"p":1},"saltLen":16}
//! ```

use crate::cipher::{EncryptedData, NONCE_SIZE, TAG_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{KdfParams, Salt, SALT_SIZE};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

/// Envelope format version written by this crate.
pub const BLOB_VERSION: &str = "1";

/// KDF identifier written into the envelope.
pub const BLOB_KDF: &str = "argon2id";

/// Wire form of [`EncryptedBlob`].
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    v: String,
    t: String,
    d: String,
    o: KdfParams,
    #[serde(rename = "saltLen")]
    salt_len: usize,
}

/// Ciphertext plus the salt and KDF parameters needed to re-derive its key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedBlob {
    pub params: KdfParams,
    pub salt: Salt,
    pub data: EncryptedData,
}

impl EncryptedBlob {
    /// Serializes to the envelope string stored remotely.
    pub fn to_json(&self) -> CryptoResult<String> {
        let mut raw = Vec::with_capacity(SALT_SIZE + self.data.len());
        raw.extend_from_slice(self.salt.as_bytes());
        raw.extend_from_slice(&self.data.to_bytes());

        let envelope = Envelope {
            v: BLOB_VERSION.to_string(),
            t: BLOB_KDF.to_string(),
            d: STANDARD.encode(&raw),
            o: self.params.clone(),
            salt_len: SALT_SIZE,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Parses an envelope string. Any structural problem is reported as
    /// [`CryptoError::InvalidBlob`].
    pub fn from_json(encoded: &str) -> CryptoResult<Self> {
        let envelope: Envelope = serde_json::from_str(encoded)
            .map_err(|e| CryptoError::InvalidBlob(format!("malformed envelope: {e}")))?;

        if envelope.v != BLOB_VERSION {
            return Err(CryptoError::InvalidBlob(format!(
                "unsupported version: {}",
                envelope.v
            )));
        }
        if envelope.t != BLOB_KDF {
            return Err(CryptoError::InvalidBlob(format!(
                "unsupported kdf: {}",
                envelope.t
            )));
        }
        if envelope.salt_len != SALT_SIZE {
            return Err(CryptoError::InvalidBlob(format!(
                "unsupported salt length: {}",
                envelope.salt_len
            )));
        }
        envelope.o.check_bounds()?;

        let raw = STANDARD
            .decode(&envelope.d)
            .map_err(|e| CryptoError::InvalidBlob(format!("invalid base64: {e}")))?;
        if raw.len() < SALT_SIZE + NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::InvalidBlob("data too short".to_string()));
        }

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&raw[..SALT_SIZE]);
        let data = EncryptedData::from_bytes(&raw[SALT_SIZE..])?;

        Ok(Self {
            params: envelope.o,
            salt: Salt::from_bytes(salt),
            data,
        })
    }

    /// True when the blob was written with a non-shared salt or with KDF
    /// parameters other than `current`. Stale blobs still decrypt.
    pub fn is_stale(&self, current: &KdfParams) -> bool {
        !self.salt.is_shared() || &self.params != current
    }
}
