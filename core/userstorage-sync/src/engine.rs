//! Sync engine.
//!
//! [`UserStorageSync`] is the public entry point: it validates paths, runs
//! each operation through the storage client, applies batch and not-found
//! policy, rewrites stale blobs, and records per-feature status.

use crate::error::{SyncError, SyncResult};
use crate::options::{SyncConfig, SyncOptions};
use crate::report::{BatchRead, BatchWrite, RemoteEntry, SkippedEntry, SyncReport};
use crate::status::{FeatureStatus, StatusTracker, SyncOperation};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};
use userstorage_client::{DecryptedEntry, EntryRead, SealedEntry, StorageClient, StorageTransport};
use userstorage_crypto::{CryptoResult, EntryIdentifier, IdentifierKey, RootSecret, SecretCipher};
use userstorage_schema::{Feature, StoragePath};

/// Orchestrates encrypted reads, writes and deletes against remote storage.
pub struct UserStorageSync {
    client: StorageClient,
    config: SyncConfig,
    status: StatusTracker,
}

impl UserStorageSync {
    /// Creates an engine over `transport`, encrypting with `config.kdf`.
    pub fn new(transport: Arc<dyn StorageTransport>, config: SyncConfig) -> Self {
        let cipher = Arc::new(SecretCipher::new(config.kdf.clone()));
        Self::with_client(StorageClient::new(transport, cipher), config)
    }

    /// Creates an engine over an existing client. Staleness is judged against
    /// the client's cipher parameters.
    pub fn with_client(client: StorageClient, config: SyncConfig) -> Self {
        Self {
            client,
            config,
            status: StatusTracker::new(),
        }
    }

    /// Returns the storage client.
    pub fn client(&self) -> &StorageClient {
        &self.client
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Entries per request, never less than one.
    pub fn batch_size(&self) -> usize {
        self.config.batch_size.max(1)
    }

    /// Status of the most recent operation on `feature`.
    pub fn status(&self, feature: Feature) -> Option<FeatureStatus> {
        self.status.get(feature)
    }

    // ── Public operations ────────────────────────────────────────

    /// Reads one entry. `Ok(None)` only when the entry is missing and the
    /// not-found policy is `Ignore`.
    pub async fn get_entry(
        &self,
        path: &StoragePath,
        secret: &RootSecret,
        options: SyncOptions,
    ) -> SyncResult<Option<String>> {
        self.tracked(
            path.feature(),
            SyncOperation::GetEntry,
            self.read_entry(path, secret, options),
        )
        .await
    }

    /// Reads every entry in a namespace.
    pub async fn get_all_entries(
        &self,
        path: &StoragePath,
        secret: &RootSecret,
        options: SyncOptions,
    ) -> SyncResult<BatchRead> {
        self.tracked(
            path.feature(),
            SyncOperation::GetAllEntries,
            self.read_all(path, secret, options),
        )
        .await
    }

    /// Encrypts and upserts one entry.
    pub async fn set_entry(
        &self,
        path: &StoragePath,
        value: &str,
        secret: &RootSecret,
    ) -> SyncResult<()> {
        self.tracked(path.feature(), SyncOperation::SetEntry, async {
            self.client
                .set_entry(path, value.as_bytes(), secret)
                .await
                .map_err(SyncError::from)
        })
        .await
    }

    /// Encrypts every entry, then uploads them in chunks of
    /// [`batch_size`](Self::batch_size). Nothing is sent unless every entry
    /// encrypts (strict) or at least the encryptable ones are known
    /// (best-effort). Chunks already sent stay applied when a later chunk
    /// fails.
    pub async fn set_all_entries<K, V>(
        &self,
        path: &StoragePath,
        entries: impl IntoIterator<Item = (K, V)>,
        secret: &RootSecret,
        options: SyncOptions,
    ) -> SyncResult<BatchWrite>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.tracked(
            path.feature(),
            SyncOperation::SetAllEntries,
            self.write_all(path, entries, secret, options),
        )
        .await
    }

    /// Deletes one entry. A missing entry is `NotFound` unless the not-found
    /// policy is `Ignore`.
    pub async fn delete_entry(
        &self,
        path: &StoragePath,
        secret: &RootSecret,
        options: SyncOptions,
    ) -> SyncResult<()> {
        self.tracked(path.feature(), SyncOperation::DeleteEntry, async {
            match self.client.delete_entry(path, secret).await {
                Err(e) if e.is_not_found() && options.ignores_not_found() => {
                    debug!(feature = %path.feature(), "entry already absent");
                    Ok(())
                }
                result => result.map_err(SyncError::from),
            }
        })
        .await
    }

    /// Deletes the listed keys of a namespace, chunked by batch size.
    pub async fn delete_entries<K: AsRef<str>>(
        &self,
        path: &StoragePath,
        keys: impl IntoIterator<Item = K>,
        secret: &RootSecret,
    ) -> SyncResult<()> {
        let keys: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_string()).collect();
        self.tracked(
            path.feature(),
            SyncOperation::DeleteEntries,
            self.remove_entries(path, &keys, secret),
        )
        .await
    }

    /// Deletes every entry of a namespace. Needs no secret.
    pub async fn delete_all_entries(
        &self,
        path: &StoragePath,
        options: SyncOptions,
    ) -> SyncResult<()> {
        self.tracked(path.feature(), SyncOperation::DeleteAllEntries, async {
            match self.client.delete_all_entries(path).await {
                Err(e) if e.is_not_found() && options.ignores_not_found() => {
                    debug!(feature = %path.feature(), "namespace already empty");
                    Ok(())
                }
                result => result.map_err(SyncError::from),
            }
        })
        .await
    }

    /// Brings a namespace in line with `local`: uploads entries that are
    /// missing, different or stale remotely and, when `prune` is set, deletes
    /// remote entries with no local counterpart.
    pub async fn reconcile_feature(
        &self,
        path: &StoragePath,
        local: &BTreeMap<String, String>,
        secret: &RootSecret,
        prune: bool,
        options: SyncOptions,
    ) -> SyncResult<SyncReport> {
        self.tracked(
            path.feature(),
            SyncOperation::Reconcile,
            self.reconcile(path, local, secret, prune, options),
        )
        .await
    }

    // ── Operation bodies ─────────────────────────────────────────

    async fn tracked<T, F>(&self, feature: Feature, operation: SyncOperation, work: F) -> SyncResult<T>
    where
        F: Future<Output = SyncResult<T>>,
    {
        self.status.begin(feature, operation);
        let result = work.await;
        self.status.finish(feature, operation, &result);
        match &result {
            Ok(_) => info!(%feature, %operation, "sync operation completed"),
            Err(e) => warn!(%feature, %operation, error = %e, "sync operation failed"),
        }
        result
    }

    async fn read_entry(
        &self,
        path: &StoragePath,
        secret: &RootSecret,
        options: SyncOptions,
    ) -> SyncResult<Option<String>> {
        let entry = match self.client.get_entry_blob(path, secret).await {
            Ok(entry) => entry,
            Err(e) if e.is_not_found() && options.ignores_not_found() => {
                debug!(feature = %path.feature(), "entry not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let (value, stale) = self.decode(Ok(entry))?;
        if stale && options.reencrypt_stale {
            warn!(feature = %path.feature(), "re-encrypting stale entry");
            self.client.set_entry(path, value.as_bytes(), secret).await?;
        }
        Ok(Some(value))
    }

    async fn read_all(
        &self,
        path: &StoragePath,
        secret: &RootSecret,
        options: SyncOptions,
    ) -> SyncResult<BatchRead> {
        let feature = path.expect_feature_only()?;
        let reads = self.client.get_all_entries(path, secret).await?;
        ensure_unique(feature, &reads)?;

        let mut batch = BatchRead::default();
        let mut stale = Vec::new();
        for read in reads {
            match self.decode(read.result) {
                Ok((value, is_stale)) => {
                    if is_stale {
                        stale.push((read.hashed_key.clone(), value.clone()));
                    }
                    batch.entries.push(RemoteEntry {
                        hashed_key: read.hashed_key,
                        value,
                    });
                }
                Err(e) if options.is_best_effort() => {
                    warn!(%feature, hashed_key = %read.hashed_key, error = %e, "skipping unreadable entry");
                    batch.skipped.push(SkippedEntry {
                        entry: read.hashed_key,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if options.reencrypt_stale && !stale.is_empty() {
            batch.reencrypted = self.rewrite_stale(feature, stale, secret).await?;
        }
        Ok(batch)
    }

    async fn remove_entries(
        &self,
        path: &StoragePath,
        keys: &[String],
        secret: &RootSecret,
    ) -> SyncResult<()> {
        path.expect_feature_only()?;
        for chunk in keys.chunks(self.batch_size()) {
            self.client.delete_entries(path, chunk, secret).await?;
        }
        Ok(())
    }

    async fn write_all<K, V>(
        &self,
        path: &StoragePath,
        entries: impl IntoIterator<Item = (K, V)>,
        secret: &RootSecret,
        options: SyncOptions,
    ) -> SyncResult<BatchWrite>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let feature = path.expect_feature_only()?;
        let id_key = IdentifierKey::derive(secret)?;

        let mut batch = BatchWrite::default();
        let mut sealed = SealedBatch::new(feature);
        for (key, value) in entries {
            let key = key.as_ref();
            match self
                .client
                .seal(&id_key, feature, key, value.as_ref().as_bytes(), secret)
            {
                Ok(entry) => sealed.push(entry)?,
                Err(e) => {
                    let e = SyncError::from(e);
                    if !options.is_best_effort() || e.is_invalid_path() {
                        return Err(e);
                    }
                    warn!(%feature, error = %e, "skipping entry that failed to encrypt");
                    batch.skipped.push(SkippedEntry {
                        entry: key.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let entries = sealed.into_entries();
        batch.written = entries.len();
        batch.requests = self.upload(feature, entries).await?;
        Ok(batch)
    }

    async fn reconcile(
        &self,
        path: &StoragePath,
        local: &BTreeMap<String, String>,
        secret: &RootSecret,
        prune: bool,
        options: SyncOptions,
    ) -> SyncResult<SyncReport> {
        let feature = path.expect_feature_only()?;
        let id_key = IdentifierKey::derive(secret)?;

        let mut wanted: BTreeMap<String, (&str, &str)> = BTreeMap::new();
        for (key, value) in local {
            StoragePath::entry(feature, key)?;
            let hashed_key = id_key.entry_id(feature, key)?.to_hex();
            if wanted
                .insert(hashed_key.clone(), (key.as_str(), value.as_str()))
                .is_some()
            {
                return Err(SyncError::IdentifierCollision { feature, hashed_key });
            }
        }

        let reads = self.client.get_all_entries(path, secret).await?;
        ensure_unique(feature, &reads)?;

        let mut report = SyncReport::default();
        let mut remote: HashMap<String, (String, bool)> = HashMap::new();
        let mut unreadable = Vec::new();
        for read in reads {
            match self.decode(read.result) {
                Ok(decoded) => {
                    remote.insert(read.hashed_key, decoded);
                }
                Err(e) if options.is_best_effort() => {
                    warn!(%feature, hashed_key = %read.hashed_key, error = %e, "unreadable remote entry");
                    report.skipped.push(SkippedEntry {
                        entry: read.hashed_key.clone(),
                        reason: e.to_string(),
                    });
                    unreadable.push(read.hashed_key);
                }
                Err(e) => return Err(e),
            }
        }

        let mut uploads = Vec::new();
        for (hashed_key, (key, value)) in &wanted {
            let up_to_date = match remote.get(hashed_key) {
                Some((remote_value, stale)) => {
                    remote_value.as_str() == *value && !(*stale && options.reencrypt_stale)
                }
                None => false,
            };
            if up_to_date {
                report.unchanged += 1;
            } else {
                uploads.push(self.client.seal(&id_key, feature, key, value.as_bytes(), secret)?);
            }
        }

        let mut doomed = Vec::new();
        if prune {
            for hashed_key in remote.keys().chain(unreadable.iter()) {
                if wanted.contains_key(hashed_key) {
                    continue;
                }
                match EntryIdentifier::from_hex(hashed_key) {
                    Ok(id) => doomed.push(id),
                    Err(e) => warn!(%feature, %hashed_key, error = %e, "cannot prune malformed record"),
                }
            }
        }

        report.uploaded = uploads.len();
        report.write_requests += self.upload(feature, uploads).await?;

        report.pruned = doomed.len();
        for chunk in doomed.chunks(self.batch_size()) {
            self.client
                .transport()
                .delete_batch(feature, chunk.to_vec())
                .await?;
            report.write_requests += 1;
        }

        info!(
            %feature,
            uploaded = report.uploaded,
            unchanged = report.unchanged,
            pruned = report.pruned,
            "reconciled namespace"
        );
        Ok(report)
    }

    // ── Helpers ──────────────────────────────────────────────────

    /// Plaintext as UTF-8 plus whether its blob is stale.
    fn decode(&self, result: CryptoResult<DecryptedEntry>) -> SyncResult<(String, bool)> {
        let entry = result?;
        let stale = entry.blob.is_stale(self.client.cipher().current_params());
        let value = String::from_utf8(entry.plaintext).map_err(|_| SyncError::invalid_utf8())?;
        Ok((value, stale))
    }

    async fn upload(&self, feature: Feature, entries: Vec<SealedEntry>) -> SyncResult<usize> {
        let mut requests = 0;
        for chunk in entries.chunks(self.batch_size()) {
            debug!(%feature, size = chunk.len(), "uploading chunk");
            self.client.put_sealed(feature, chunk.to_vec()).await?;
            requests += 1;
        }
        Ok(requests)
    }

    async fn rewrite_stale(
        &self,
        feature: Feature,
        stale: Vec<(String, String)>,
        secret: &RootSecret,
    ) -> SyncResult<usize> {
        let cipher = self.client.cipher();
        let mut batch = Vec::with_capacity(stale.len());
        for (hashed_key, value) in stale {
            let id = match EntryIdentifier::from_hex(&hashed_key) {
                Ok(id) => id,
                Err(e) => {
                    warn!(%feature, %hashed_key, error = %e, "cannot re-encrypt malformed record");
                    continue;
                }
            };
            batch.push((id, cipher.encrypt_to_string(value.as_bytes(), secret)?));
        }
        if batch.is_empty() {
            return Ok(0);
        }

        warn!(%feature, count = batch.len(), "re-encrypting stale entries");
        for chunk in batch.chunks(self.batch_size()) {
            self.client
                .transport()
                .put_batch(feature, chunk.to_vec())
                .await?;
        }
        Ok(batch.len())
    }
}

impl std::fmt::Debug for UserStorageSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStorageSync")
            .field("client", &self.client)
            .field("config", &self.config)
            .finish()
    }
}

/// Remote namespaces are keyed by hashed key; a repeat means two entries
/// claim the same identifier.
fn ensure_unique(feature: Feature, reads: &[EntryRead]) -> SyncResult<()> {
    let mut seen = HashSet::with_capacity(reads.len());
    for read in reads {
        if !seen.insert(read.hashed_key.as_str()) {
            return Err(SyncError::IdentifierCollision {
                feature,
                hashed_key: read.hashed_key.clone(),
            });
        }
    }
    Ok(())
}

/// Sealed entries of one write, deduplicated by identifier.
struct SealedBatch {
    feature: Feature,
    entries: Vec<SealedEntry>,
    index: HashMap<EntryIdentifier, usize>,
}

impl SealedBatch {
    fn new(feature: Feature) -> Self {
        Self {
            feature,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// A repeated key replaces its earlier value; a different key with the
    /// same identifier is a collision.
    fn push(&mut self, entry: SealedEntry) -> SyncResult<()> {
        match self.index.get(&entry.hashed_key) {
            Some(&i) if self.entries[i].key == entry.key => self.entries[i] = entry,
            Some(_) => {
                return Err(SyncError::IdentifierCollision {
                    feature: self.feature,
                    hashed_key: entry.hashed_key.to_hex(),
                });
            }
            None => {
                self.index.insert(entry.hashed_key, self.entries.len());
                self.entries.push(entry);
            }
        }
        Ok(())
    }

    fn into_entries(self) -> Vec<SealedEntry> {
        self.entries
    }
}
