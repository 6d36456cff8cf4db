//! Wire types and endpoint paths of the user-storage REST API.

use crate::config::UserStorageConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use userstorage_crypto::EntryIdentifier;
use userstorage_schema::Feature;

/// A record as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRecord {
    #[serde(rename = "HashedKey")]
    pub hashed_key: String,
    #[serde(rename = "Data")]
    pub data: String,
}

/// Body of `PUT /{feature}/{hashedKey}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutEntryBody {
    #[serde(rename = "Data")]
    pub data: String,
}

/// Body of the batch upsert `PUT /{feature}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPutBody {
    #[serde(rename = "Data")]
    pub data: BTreeMap<String, String>,
}

/// Body of the batch delete `PUT /{feature}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDeleteBody {
    pub batch_delete: Vec<String>,
}

/// `{base}/api/v1/userstorage/{feature}`
pub fn feature_url(config: &UserStorageConfig, feature: Feature) -> String {
    format!("{}/{}", config.user_storage_root(), feature.as_str())
}

/// `{base}/api/v1/userstorage/{feature}/{hashedKey}`
pub fn entry_url(config: &UserStorageConfig, feature: Feature, id: &EntryIdentifier) -> String {
    format!("{}/{}", feature_url(config, feature), id.to_hex())
}
