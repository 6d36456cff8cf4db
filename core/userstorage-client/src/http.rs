//! HTTP transport for the user-storage REST API.

use crate::api::{self, BatchDeleteBody, BatchPutBody, PutEntryBody, StorageRecord};
use crate::config::UserStorageConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::{AccessTokenProvider, StorageTransport};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use tracing::debug;
use userstorage_crypto::EntryIdentifier;
use userstorage_schema::Feature;

/// `reqwest`-backed transport.
pub struct HttpTransport {
    config: UserStorageConfig,
    client: Client,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl HttpTransport {
    /// Creates a transport after validating `config`.
    pub fn new(config: UserStorageConfig, tokens: Arc<dyn AccessTokenProvider>) -> ClientResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            tokens,
        })
    }

    /// Returns the validated configuration.
    pub fn config(&self) -> &UserStorageConfig {
        &self.config
    }

    /// Attaches the bearer token and sends.
    async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let token = self.tokens.access_token().await?;
        Ok(request.bearer_auth(token).send().await?)
    }

    /// Maps 404 to `NotFound` and any other non-success status to `Api`.
    async fn check(response: Response, what: impl FnOnce() -> String) -> ClientResult<Response> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(what()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl StorageTransport for HttpTransport {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn get(&self, feature: Feature, id: &EntryIdentifier) -> ClientResult<StorageRecord> {
        let url = api::entry_url(&self.config, feature, id);
        debug!(%feature, hashed_key = %id, "GET user storage entry");

        let response = self.send(self.client.get(&url)).await?;
        let response = Self::check(response, || format!("{feature}/{id}")).await?;
        Ok(response.json().await?)
    }

    async fn get_all(&self, feature: Feature) -> ClientResult<Vec<StorageRecord>> {
        let url = api::feature_url(&self.config, feature);
        debug!(%feature, "GET all user storage entries");

        let response = self.send(self.client.get(&url)).await?;
        let response = match Self::check(response, || feature.to_string()).await {
            Ok(response) => response,
            Err(ClientError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Option<Vec<StorageRecord>> = serde_json::from_str(&body)?;
        Ok(records.unwrap_or_default())
    }

    async fn put(&self, feature: Feature, id: &EntryIdentifier, data: String) -> ClientResult<()> {
        let url = api::entry_url(&self.config, feature, id);
        debug!(%feature, hashed_key = %id, "PUT user storage entry");

        let response = self
            .send(self.client.put(&url).json(&PutEntryBody { data }))
            .await?;
        Self::check(response, || format!("{feature}/{id}")).await?;
        Ok(())
    }

    async fn put_batch(
        &self,
        feature: Feature,
        entries: Vec<(EntryIdentifier, String)>,
    ) -> ClientResult<()> {
        let url = api::feature_url(&self.config, feature);
        debug!(%feature, count = entries.len(), "PUT user storage batch");

        let body = BatchPutBody {
            data: entries
                .into_iter()
                .map(|(id, data)| (id.to_hex(), data))
                .collect(),
        };
        let response = self.send(self.client.put(&url).json(&body)).await?;
        Self::check(response, || feature.to_string()).await?;
        Ok(())
    }

    async fn delete(&self, feature: Feature, id: &EntryIdentifier) -> ClientResult<()> {
        let url = api::entry_url(&self.config, feature, id);
        debug!(%feature, hashed_key = %id, "DELETE user storage entry");

        let response = self.send(self.client.delete(&url)).await?;
        Self::check(response, || format!("{feature}/{id}")).await?;
        Ok(())
    }

    async fn delete_batch(&self, feature: Feature, ids: Vec<EntryIdentifier>) -> ClientResult<()> {
        let url = api::feature_url(&self.config, feature);
        debug!(%feature, count = ids.len(), "PUT user storage batch delete");

        let body = BatchDeleteBody {
            batch_delete: ids.iter().map(EntryIdentifier::to_hex).collect(),
        };
        let response = self.send(self.client.put(&url).json(&body)).await?;
        Self::check(response, || feature.to_string()).await?;
        Ok(())
    }

    async fn delete_all(&self, feature: Feature) -> ClientResult<()> {
        let url = api::feature_url(&self.config, feature);
        debug!(%feature, "DELETE all user storage entries");

        let response = self.send(self.client.delete(&url)).await?;
        Self::check(response, || feature.to_string()).await?;
        Ok(())
    }
}
