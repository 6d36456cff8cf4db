//! Request/response fixtures for unit and end-to-end tests.
//!
//! Each builder returns a [`MockResponse`] describing the URL, HTTP method and
//! response body the real service would produce for a path. Payloads are
//! encrypted under [`MOCK_STORAGE_SECRET`] so a client configured with the
//! same secret can decrypt them.

use crate::api::{self, StorageRecord};
use crate::config::UserStorageConfig;
use crate::error::{ClientError, ClientResult};
use serde::Serialize;
use userstorage_crypto::{
    EntryIdentifier, IdentifierKey, KdfParams, PayloadCipher, RootSecret, SecretCipher,
};
use userstorage_schema::{Feature, StoragePath};

/// Root secret the fixtures are encrypted under.
pub const MOCK_STORAGE_SECRET: &str = "mock-user-storage-secret";

/// Plaintext used when a fixture is built without explicit data.
pub const MOCK_STORAGE_DATA: &str = r#"{"hello":"world"}"#;

/// Default single-entry path for fixtures.
pub const MOCK_ENTRY_PATH: &str = "notifications.notification_settings";

/// Default namespace path for fixtures.
pub const MOCK_FEATURE_PATH: &str = "notifications";

/// KDF parameters for fixtures, cheap enough for test suites.
pub fn mock_kdf_params() -> KdfParams {
    KdfParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

/// HTTP method of a mocked request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MockMethod {
    Get,
    Put,
    Delete,
}

impl MockMethod {
    /// Returns the HTTP method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MockMethod::Get => "GET",
            MockMethod::Put => "PUT",
            MockMethod::Delete => "DELETE",
        }
    }
}

/// A mocked request and the body the service answers with.
#[derive(Debug, Clone, Serialize)]
pub struct MockResponse {
    pub url: String,
    #[serde(rename = "requestMethod")]
    pub method: MockMethod,
    pub response: serde_json::Value,
}

impl MockResponse {
    /// The path component of `url`, for servers that match on path only.
    pub fn path(&self) -> ClientResult<String> {
        let url = url::Url::parse(&self.url)
            .map_err(|e| ClientError::Config(format!("invalid mock url: {e}")))?;
        Ok(url.path().to_string())
    }
}

/// Builds fixtures against one API configuration.
pub struct MockFixtures {
    config: UserStorageConfig,
    secret: RootSecret,
    cipher: SecretCipher,
}

impl MockFixtures {
    /// Fixtures for the API at `config`, sealed with the mock secret.
    pub fn new(config: UserStorageConfig) -> Self {
        Self {
            config,
            secret: RootSecret::from(MOCK_STORAGE_SECRET),
            cipher: SecretCipher::new(mock_kdf_params()),
        }
    }

    /// Returns the secret fixture payloads are sealed with.
    pub fn secret(&self) -> &RootSecret {
        &self.secret
    }

    /// Returns the API configuration the URLs are built from.
    pub fn config(&self) -> &UserStorageConfig {
        &self.config
    }

    /// URL for a path: the namespace URL for feature-only paths, the entry URL
    /// (with the mock secret's hashed key) for `feature.key` paths.
    pub fn endpoint(&self, path: &StoragePath) -> ClientResult<String> {
        match path {
            StoragePath::FeatureOnly(feature) => Ok(api::feature_url(&self.config, *feature)),
            StoragePath::FeatureAndKey(entry) => {
                let id = self.hashed_key(entry.feature(), entry.key())?;
                Ok(api::entry_url(&self.config, entry.feature(), &id))
            }
        }
    }

    /// Encrypted envelope for `data` (or [`MOCK_STORAGE_DATA`]).
    pub fn encrypted_data(&self, data: Option<&str>) -> ClientResult<String> {
        let plaintext = data.unwrap_or(MOCK_STORAGE_DATA);
        Ok(self
            .cipher
            .encrypt_to_string(plaintext.as_bytes(), &self.secret)?)
    }

    /// `GET /{feature}/{hashedKey}` answered with one record.
    pub fn get_response(&self, path: &StoragePath, data: Option<&str>) -> ClientResult<MockResponse> {
        let entry = path.expect_entry()?;
        let record = StorageRecord {
            hashed_key: self.hashed_key(entry.feature(), entry.key())?.to_hex(),
            data: self.encrypted_data(data)?,
        };
        Ok(MockResponse {
            url: self.endpoint(path)?,
            method: MockMethod::Get,
            response: serde_json::to_value(record)?,
        })
    }

    /// `GET /{feature}` answered with one record per item of `data`
    /// (or a single [`MOCK_STORAGE_DATA`] record when empty).
    pub fn get_all_response(&self, path: &StoragePath, data: &[&str]) -> ClientResult<MockResponse> {
        let feature = path.expect_feature_only()?;
        let items: Vec<&str> = if data.is_empty() {
            vec![MOCK_STORAGE_DATA]
        } else {
            data.to_vec()
        };

        let records = items
            .iter()
            .enumerate()
            .map(|(i, item)| -> ClientResult<StorageRecord> {
                Ok(StorageRecord {
                    hashed_key: self.hashed_key(feature, &format!("entry_{i}"))?.to_hex(),
                    data: self.encrypted_data(Some(*item))?,
                })
            })
            .collect::<ClientResult<Vec<_>>>()?;

        Ok(MockResponse {
            url: self.endpoint(path)?,
            method: MockMethod::Get,
            response: serde_json::to_value(records)?,
        })
    }

    /// `PUT /{feature}/{hashedKey}`.
    pub fn put_response(&self, path: &StoragePath) -> ClientResult<MockResponse> {
        path.expect_entry()?;
        self.empty(path, MockMethod::Put)
    }

    /// Batch upsert `PUT /{feature}`.
    pub fn batch_put_response(&self, path: &StoragePath) -> ClientResult<MockResponse> {
        path.expect_feature_only()?;
        self.empty(path, MockMethod::Put)
    }

    /// Batch delete `PUT /{feature}` with a `batch_delete` body.
    pub fn batch_delete_response(&self, path: &StoragePath) -> ClientResult<MockResponse> {
        path.expect_feature_only()?;
        self.empty(path, MockMethod::Put)
    }

    /// `DELETE /{feature}/{hashedKey}`.
    pub fn delete_response(&self, path: &StoragePath) -> ClientResult<MockResponse> {
        path.expect_entry()?;
        self.empty(path, MockMethod::Delete)
    }

    /// `DELETE /{feature}`.
    pub fn delete_all_response(&self, path: &StoragePath) -> ClientResult<MockResponse> {
        path.expect_feature_only()?;
        self.empty(path, MockMethod::Delete)
    }

    fn empty(&self, path: &StoragePath, method: MockMethod) -> ClientResult<MockResponse> {
        Ok(MockResponse {
            url: self.endpoint(path)?,
            method,
            response: serde_json::Value::Null,
        })
    }

    fn hashed_key(&self, feature: Feature, key: &str) -> ClientResult<EntryIdentifier> {
        Ok(IdentifierKey::derive(&self.secret)?.entry_id(feature, key)?)
    }
}
