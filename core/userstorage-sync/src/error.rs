//! Error types for the sync core.
//!
//! Every failure surfaces as one of four kinds callers act on: a bad path
//! (caller bug), unreadable stored data, a missing entry, or a transport
//! failure. Anything else from the lower layers is carried in `Client`.

use thiserror::Error;
use userstorage_client::ClientError;
use userstorage_crypto::CryptoError;
use userstorage_schema::{Feature, InvalidPathError};

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed or unknown path. Not retried.
    #[error("invalid storage path: {0}")]
    InvalidPath(#[from] InvalidPathError),

    /// Stored data failed authentication or could not be parsed with this
    /// secret.
    #[error("decryption failed: {0}")]
    Decryption(#[source] CryptoError),

    /// The remote entry or namespace does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network, timeout or non-success HTTP status.
    #[error("transport error: {0}")]
    Transport(#[source] ClientError),

    /// Any other storage client failure (configuration, auth, key derivation).
    #[error("storage client error: {0}")]
    Client(#[source] ClientError),

    /// Two distinct entries in one batch map to the same identifier.
    #[error("identifier collision in {feature}: {hashed_key}")]
    IdentifierCollision { feature: Feature, hashed_key: String },
}

impl SyncError {
    /// The entry or namespace does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound(_))
    }

    /// Stored data could not be read with this secret.
    pub fn is_decryption(&self) -> bool {
        matches!(self, SyncError::Decryption(_))
    }

    /// Network, timeout or non-success status.
    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }

    /// Malformed or mismatched path.
    pub fn is_invalid_path(&self) -> bool {
        matches!(self, SyncError::InvalidPath(_))
    }

    pub(crate) fn invalid_utf8() -> Self {
        SyncError::Decryption(CryptoError::Decryption(
            "payload is not valid UTF-8".to_string(),
        ))
    }
}

impl From<ClientError> for SyncError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidPath(e) => SyncError::InvalidPath(e),
            ClientError::NotFound(what) => SyncError::NotFound(what),
            ClientError::Crypto(e) => SyncError::from(e),
            e if e.is_transport() => SyncError::Transport(e),
            e => SyncError::Client(e),
        }
    }
}

impl From<CryptoError> for SyncError {
    fn from(err: CryptoError) -> Self {
        if err.is_decryption_failure() {
            SyncError::Decryption(err)
        } else {
            SyncError::Client(ClientError::Crypto(err))
        }
    }
}
