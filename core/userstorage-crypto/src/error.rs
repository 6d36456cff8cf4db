//! Crypto errors.

use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Failures deriving identifiers or keys, sealing payloads, or opening blobs.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Argon2 rejected the parameters or failed to hash.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Authentication tag mismatch: wrong secret or tampered data.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// The stored blob is not a well-formed envelope.
    #[error("invalid encrypted blob: {0}")]
    InvalidBlob(String),

    /// A hashed key that is not 64 hex characters.
    #[error("invalid entry identifier: {0}")]
    InvalidIdentifier(String),

    /// Identifiers are only derived for `feature.key` paths.
    #[error("cannot derive an entry identifier for feature-only path: {0}")]
    FeatureOnlyPath(String),

    #[error("envelope serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CryptoError {
    /// True for failures that mean "this stored data cannot be read with this
    /// secret": authentication failures and malformed envelopes.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, CryptoError::Decryption(_) | CryptoError::InvalidBlob(_))
    }
}
