//! Transport abstraction over the remote user-storage API.
//!
//! Transports move opaque records; they never see plaintext or secrets.
//! [`HttpTransport`](crate::HttpTransport) talks to the real service and
//! [`MemoryTransport`](crate::MemoryTransport) keeps records in process.

use crate::api::StorageRecord;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use userstorage_crypto::EntryIdentifier;
use userstorage_schema::Feature;

/// Raw record operations, one call per remote request.
#[async_trait]
pub trait StorageTransport: Send + Sync {
    /// Returns the name of the transport.
    fn name(&self) -> &'static str;

    /// Fetches one record. `NotFound` when absent.
    async fn get(&self, feature: Feature, id: &EntryIdentifier) -> ClientResult<StorageRecord>;

    /// Fetches every record in a namespace. An absent namespace is empty.
    async fn get_all(&self, feature: Feature) -> ClientResult<Vec<StorageRecord>>;

    /// Upserts one record.
    async fn put(&self, feature: Feature, id: &EntryIdentifier, data: String) -> ClientResult<()>;

    /// Upserts many records in a single request.
    async fn put_batch(
        &self,
        feature: Feature,
        entries: Vec<(EntryIdentifier, String)>,
    ) -> ClientResult<()>;

    /// Deletes one record. `NotFound` when absent.
    async fn delete(&self, feature: Feature, id: &EntryIdentifier) -> ClientResult<()>;

    /// Deletes the listed records in a single request.
    async fn delete_batch(&self, feature: Feature, ids: Vec<EntryIdentifier>) -> ClientResult<()>;

    /// Deletes every record in a namespace.
    async fn delete_all(&self, feature: Feature) -> ClientResult<()>;
}

/// Supplies the bearer token attached to every request.
///
/// Token acquisition and refresh belong to the caller's auth layer.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> ClientResult<String>;
}

/// A fixed, pre-acquired access token.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Wraps a pre-acquired token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> ClientResult<String> {
        if self.token.is_empty() {
            return Err(ClientError::AuthRequired);
        }
        Ok(self.token.clone())
    }
}
