//! Storage client adapter.
//!
//! Translates path-level operations into transport calls: derives the entry
//! identifier, encrypts on write, decrypts on read. Batch policy (strict or
//! best-effort) is left to the caller: bulk reads return one [`EntryRead`] per
//! record with its own decrypt result.

use crate::api::StorageRecord;
use crate::error::ClientResult;
use crate::transport::StorageTransport;
use std::sync::Arc;
use tracing::debug;
use userstorage_crypto::{
    CryptoResult, EncryptedBlob, EntryIdentifier, IdentifierKey, PayloadCipher, RootSecret,
};
use userstorage_schema::{Feature, StoragePath};

/// Plaintext recovered from a record, with the parsed blob it came from.
#[derive(Debug, Clone)]
pub struct DecryptedEntry {
    pub plaintext: Vec<u8>,
    pub blob: EncryptedBlob,
}

/// One record of a bulk read.
#[derive(Debug)]
pub struct EntryRead {
    pub hashed_key: String,
    pub result: CryptoResult<DecryptedEntry>,
}

/// An entry encrypted and addressed, ready to upload.
#[derive(Debug, Clone)]
pub struct SealedEntry {
    pub key: String,
    pub hashed_key: EntryIdentifier,
    pub data: String,
}

/// Path-level client over a transport and a payload cipher.
#[derive(Clone)]
pub struct StorageClient {
    transport: Arc<dyn StorageTransport>,
    cipher: Arc<dyn PayloadCipher>,
}

impl StorageClient {
    /// Creates a client over `transport`, sealing payloads with `cipher`.
    pub fn new(transport: Arc<dyn StorageTransport>, cipher: Arc<dyn PayloadCipher>) -> Self {
        Self { transport, cipher }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &Arc<dyn StorageTransport> {
        &self.transport
    }

    /// Returns the payload cipher.
    pub fn cipher(&self) -> &Arc<dyn PayloadCipher> {
        &self.cipher
    }

    // ── Building blocks ──────────────────────────────────────────

    /// Validates `key` under `feature`, derives its identifier and encrypts.
    pub fn seal(
        &self,
        id_key: &IdentifierKey,
        feature: Feature,
        key: &str,
        plaintext: &[u8],
        secret: &RootSecret,
    ) -> ClientResult<SealedEntry> {
        StoragePath::entry(feature, key)?;
        let hashed_key = id_key.entry_id(feature, key)?;
        let data = self.cipher.encrypt_to_string(plaintext, secret)?;
        Ok(SealedEntry {
            key: key.to_string(),
            hashed_key,
            data,
        })
    }

    /// Parses and decrypts a record's `Data`.
    pub fn open(&self, record: &StorageRecord, secret: &RootSecret) -> CryptoResult<DecryptedEntry> {
        let blob = EncryptedBlob::from_json(&record.data)?;
        let plaintext = self.cipher.decrypt(&blob, secret)?;
        Ok(DecryptedEntry { plaintext, blob })
    }

    /// Uploads sealed entries in one batch request.
    pub async fn put_sealed(&self, feature: Feature, entries: Vec<SealedEntry>) -> ClientResult<()> {
        let batch = entries
            .into_iter()
            .map(|entry| (entry.hashed_key, entry.data))
            .collect();
        self.transport.put_batch(feature, batch).await
    }

    // ── Single entry ─────────────────────────────────────────────

    /// Reads and decrypts one entry.
    pub async fn get_entry(&self, path: &StoragePath, secret: &RootSecret) -> ClientResult<Vec<u8>> {
        Ok(self.get_entry_blob(path, secret).await?.plaintext)
    }

    /// Like [`get_entry`](Self::get_entry) but keeps the parsed blob.
    pub async fn get_entry_blob(
        &self,
        path: &StoragePath,
        secret: &RootSecret,
    ) -> ClientResult<DecryptedEntry> {
        let entry = path.expect_entry()?;
        let id = IdentifierKey::derive(secret)?.entry_id(entry.feature(), entry.key())?;
        let record = self.transport.get(entry.feature(), &id).await?;
        Ok(self.open(&record, secret)?)
    }

    /// Encrypts and upserts one entry.
    pub async fn set_entry(
        &self,
        path: &StoragePath,
        plaintext: &[u8],
        secret: &RootSecret,
    ) -> ClientResult<()> {
        let entry = path.expect_entry()?;
        let id_key = IdentifierKey::derive(secret)?;
        let sealed = self.seal(&id_key, entry.feature(), entry.key(), plaintext, secret)?;
        self.transport
            .put(entry.feature(), &sealed.hashed_key, sealed.data)
            .await
    }

    /// Deletes one entry. A missing entry is reported as `NotFound`.
    pub async fn delete_entry(&self, path: &StoragePath, secret: &RootSecret) -> ClientResult<()> {
        let entry = path.expect_entry()?;
        let id = IdentifierKey::derive(secret)?.entry_id(entry.feature(), entry.key())?;
        self.transport.delete(entry.feature(), &id).await
    }

    // ── Whole namespace ──────────────────────────────────────────

    /// Reads every record in a namespace, decrypting each independently.
    pub async fn get_all_entries(
        &self,
        path: &StoragePath,
        secret: &RootSecret,
    ) -> ClientResult<Vec<EntryRead>> {
        let feature = path.expect_feature_only()?;
        let records = self.transport.get_all(feature).await?;
        debug!(%feature, count = records.len(), "decrypting namespace records");

        Ok(records
            .iter()
            .map(|record| EntryRead {
                hashed_key: record.hashed_key.clone(),
                result: self.open(record, secret),
            })
            .collect())
    }

    /// Encrypts every entry, then upserts them in one request. Any entry that
    /// fails validation or encryption fails the call before anything is sent.
    pub async fn set_all_entries<K, V>(
        &self,
        path: &StoragePath,
        entries: impl IntoIterator<Item = (K, V)>,
        secret: &RootSecret,
    ) -> ClientResult<()>
    where
        K: AsRef<str>,
        V: AsRef<[u8]>,
    {
        let feature = path.expect_feature_only()?;
        let id_key = IdentifierKey::derive(secret)?;
        let sealed = entries
            .into_iter()
            .map(|(key, value)| self.seal(&id_key, feature, key.as_ref(), value.as_ref(), secret))
            .collect::<ClientResult<Vec<_>>>()?;
        self.put_sealed(feature, sealed).await
    }

    /// Deletes the listed keys of a namespace in one request.
    pub async fn delete_entries<K: AsRef<str>>(
        &self,
        path: &StoragePath,
        keys: impl IntoIterator<Item = K>,
        secret: &RootSecret,
    ) -> ClientResult<()> {
        let feature = path.expect_feature_only()?;
        let id_key = IdentifierKey::derive(secret)?;
        let ids = keys
            .into_iter()
            .map(|key| -> ClientResult<EntryIdentifier> {
                StoragePath::entry(feature, key.as_ref())?;
                Ok(id_key.entry_id(feature, key.as_ref())?)
            })
            .collect::<ClientResult<Vec<_>>>()?;
        self.transport.delete_batch(feature, ids).await
    }

    /// Deletes every entry in a namespace. Needs no secret: the namespace is
    /// addressed in plaintext.
    pub async fn delete_all_entries(&self, path: &StoragePath) -> ClientResult<()> {
        let feature = path.expect_feature_only()?;
        self.transport.delete_all(feature).await
    }
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("transport", &self.transport.name())
            .finish()
    }
}
