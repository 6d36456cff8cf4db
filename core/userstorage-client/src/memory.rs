//! In-process transport.
//!
//! Mirrors the remote service's semantics (404s, last-write-wins upserts) so
//! the adapter and sync core can be exercised without a network. Also lets
//! tests plant raw records and inject write failures.

use crate::api::StorageRecord;
use crate::error::{ClientError, ClientResult};
use crate::transport::StorageTransport;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;
use userstorage_crypto::EntryIdentifier;
use userstorage_schema::Feature;

/// Records kept in memory, keyed by feature then hashed key.
#[derive(Default)]
pub struct MemoryTransport {
    records: RwLock<HashMap<Feature, BTreeMap<String, String>>>,
    requests: AtomicUsize,
    /// Remaining successful writes before injected failures; `None` = unlimited.
    write_budget: Mutex<Option<usize>>,
}

impl MemoryTransport {
    /// Creates an empty store with no write budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record verbatim, bypassing encryption.
    pub async fn insert_raw(&self, feature: Feature, hashed_key: impl Into<String>, data: impl Into<String>) {
        self.records
            .write()
            .await
            .entry(feature)
            .or_default()
            .insert(hashed_key.into(), data.into());
    }

    /// Reads a stored record verbatim.
    pub async fn raw(&self, feature: Feature, hashed_key: &str) -> Option<String> {
        self.records
            .read()
            .await
            .get(&feature)
            .and_then(|entries| entries.get(hashed_key).cloned())
    }

    /// Number of records stored under `feature`.
    pub async fn len(&self, feature: Feature) -> usize {
        self.records
            .read()
            .await
            .get(&feature)
            .map_or(0, BTreeMap::len)
    }

    /// Total requests served so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Allows `budget` more successful writes; later writes fail with a
    /// transport error. `None` removes the limit.
    pub fn set_write_budget(&self, budget: Option<usize>) {
        if let Ok(mut guard) = self.write_budget.lock() {
            *guard = budget;
        }
    }

    fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    fn take_write(&self) -> ClientResult<()> {
        let mut guard = self
            .write_budget
            .lock()
            .map_err(|_| ClientError::Transport("write budget lock poisoned".to_string()))?;
        match guard.as_mut() {
            None => Ok(()),
            Some(0) => Err(ClientError::Transport("injected write failure".to_string())),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl StorageTransport for MemoryTransport {
    fn name(&self) -> &'static str {
        "Memory"
    }

    async fn get(&self, feature: Feature, id: &EntryIdentifier) -> ClientResult<StorageRecord> {
        self.record_request();
        let hashed_key = id.to_hex();
        self.raw(feature, &hashed_key)
            .await
            .map(|data| StorageRecord { hashed_key, data })
            .ok_or_else(|| ClientError::NotFound(format!("{feature}/{id}")))
    }

    async fn get_all(&self, feature: Feature) -> ClientResult<Vec<StorageRecord>> {
        self.record_request();
        let records = self.records.read().await;
        Ok(records
            .get(&feature)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(hashed_key, data)| StorageRecord {
                        hashed_key: hashed_key.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put(&self, feature: Feature, id: &EntryIdentifier, data: String) -> ClientResult<()> {
        self.record_request();
        self.take_write()?;
        self.insert_raw(feature, id.to_hex(), data).await;
        Ok(())
    }

    async fn put_batch(
        &self,
        feature: Feature,
        entries: Vec<(EntryIdentifier, String)>,
    ) -> ClientResult<()> {
        self.record_request();
        self.take_write()?;
        let mut records = self.records.write().await;
        let namespace = records.entry(feature).or_default();
        for (id, data) in entries {
            namespace.insert(id.to_hex(), data);
        }
        Ok(())
    }

    async fn delete(&self, feature: Feature, id: &EntryIdentifier) -> ClientResult<()> {
        self.record_request();
        self.take_write()?;
        let mut records = self.records.write().await;
        records
            .get_mut(&feature)
            .and_then(|entries| entries.remove(&id.to_hex()))
            .map(|_| ())
            .ok_or_else(|| ClientError::NotFound(format!("{feature}/{id}")))
    }

    async fn delete_batch(&self, feature: Feature, ids: Vec<EntryIdentifier>) -> ClientResult<()> {
        self.record_request();
        self.take_write()?;
        let mut records = self.records.write().await;
        if let Some(entries) = records.get_mut(&feature) {
            for id in ids {
                entries.remove(&id.to_hex());
            }
        }
        Ok(())
    }

    async fn delete_all(&self, feature: Feature) -> ClientResult<()> {
        self.record_request();
        self.take_write()?;
        let mut records = self.records.write().await;
        match records.remove(&feature) {
            Some(entries) if !entries.is_empty() => Ok(()),
            _ => Err(ClientError::NotFound(feature.to_string())),
        }
    }
}
