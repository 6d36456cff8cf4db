//! Storage client error types.

use thiserror::Error;
use userstorage_crypto::CryptoError;
use userstorage_schema::InvalidPathError;

/// Result type for storage client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur talking to the remote user-storage API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid storage path: {0}")]
    InvalidPath(#[from] InvalidPathError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("authentication required")]
    AuthRequired,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// The remote entry (or namespace) does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    /// Network, timeout or non-success HTTP status.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Http(_) | ClientError::Transport(_) | ClientError::Api { .. }
        )
    }

    /// Stored data could not be authenticated or parsed with this secret.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, ClientError::Crypto(e) if e.is_decryption_failure())
    }

    /// Returns true if this error came from a request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_timeout())
    }
}
