use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::sync::Arc;
use userstorage_client::{MemoryTransport, StorageClient};
use userstorage_crypto::{
    derive_entry_id, CryptoError, CryptoResult, EncryptedBlob, KdfParams, PayloadCipher,
    RootSecret, Salt, SecretCipher,
};
use userstorage_schema::{Feature, StoragePath};
use userstorage_sync::{
    BatchMode, NotFoundPolicy, SyncConfig, SyncError, SyncOperation, SyncOptions, SyncStatus,
    UserStorageSync,
};

fn fast_params() -> KdfParams {
    KdfParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

fn old_params() -> KdfParams {
    KdfParams {
        memory_cost: 2048,
        time_cost: 1,
        parallelism: 1,
    }
}

fn make_engine(batch_size: usize) -> (UserStorageSync, Arc<MemoryTransport>) {
    let transport = Arc::new(MemoryTransport::new());
    let engine = UserStorageSync::new(
        transport.clone(),
        SyncConfig {
            batch_size,
            kdf: fast_params(),
        },
    );
    (engine, transport)
}

fn path(s: &str) -> StoragePath {
    StoragePath::parse(s).unwrap()
}

fn secret() -> RootSecret {
    RootSecret::from("engine-test-secret")
}

/// Stores `value` at `p` the way an older client would have.
async fn plant_stale(
    transport: &MemoryTransport,
    p: &str,
    value: &str,
    secret: &RootSecret,
    random_salt: bool,
) {
    let p = path(p);
    let (cipher, salt) = if random_salt {
        (SecretCipher::new(fast_params()), Salt::random())
    } else {
        (SecretCipher::new(old_params()), Salt::shared())
    };
    let blob = cipher
        .encrypt_with_salt(value.as_bytes(), secret, salt)
        .unwrap();
    let id = derive_entry_id(&p, secret).unwrap();
    transport
        .insert_raw(p.feature(), id.to_hex(), blob.to_json().unwrap())
        .await;
}

async fn stored_blob(transport: &MemoryTransport, p: &str, secret: &RootSecret) -> EncryptedBlob {
    let p = path(p);
    let id = derive_entry_id(&p, secret).unwrap();
    let raw = transport.raw(p.feature(), &id.to_hex()).await.unwrap();
    EncryptedBlob::from_json(&raw).unwrap()
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn defaults() {
    let config = SyncConfig::default();
    assert_eq!(config.batch_size, 100);
    assert_eq!(config.kdf, KdfParams::default());

    let options = SyncOptions::default();
    assert_eq!(options.batch_mode, BatchMode::Strict);
    assert_eq!(options.not_found, NotFoundPolicy::Surface);
    assert!(options.reencrypt_stale);
}

#[test]
fn zero_batch_size_is_clamped() {
    let (engine, _) = make_engine(0);
    assert_eq!(engine.batch_size(), 1);
}

// ── Single entries ───────────────────────────────────────────────

#[tokio::test]
async fn set_then_get() {
    let (engine, _) = make_engine(100);
    let p = path("notifications.notification_settings");

    engine.set_entry(&p, "on", &secret()).await.unwrap();
    let value = engine
        .get_entry(&p, &secret(), SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(value.as_deref(), Some("on"));
}

#[tokio::test]
async fn overwrite_returns_latest() {
    let (engine, _) = make_engine(100);
    let p = path("networks.mainnet");

    engine.set_entry(&p, "v1", &secret()).await.unwrap();
    engine.set_entry(&p, "v2", &secret()).await.unwrap();
    let value = engine
        .get_entry(&p, &secret(), SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(value.as_deref(), Some("v2"));
}

#[tokio::test]
async fn missing_entry_is_not_found_by_default() {
    let (engine, _) = make_engine(100);
    let err = engine
        .get_entry(&path("networks.none"), &secret(), SyncOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn missing_entry_is_none_when_ignored() {
    let (engine, _) = make_engine(100);
    let value = engine
        .get_entry(
            &path("networks.none"),
            &secret(),
            SyncOptions::default().ignore_not_found(),
        )
        .await
        .unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn wrong_secret_is_decryption_error() {
    let (engine, transport) = make_engine(100);
    let p = path("accounts.main");
    let owner = secret();
    let other = RootSecret::from("someone-else");

    engine.set_entry(&p, "value", &owner).await.unwrap();
    let blob = stored_blob(&transport, "accounts.main", &owner).await;
    let other_id = derive_entry_id(&p, &other).unwrap();
    transport
        .insert_raw(Feature::Accounts, other_id.to_hex(), blob.to_json().unwrap())
        .await;

    let err = engine
        .get_entry(&p, &other, SyncOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_decryption());
}

#[tokio::test]
async fn non_utf8_payload_is_decryption_error() {
    let (engine, transport) = make_engine(100);
    let p = path("accounts.bytes");
    let cipher = SecretCipher::new(fast_params());
    let blob = cipher.encrypt(&[0xff, 0xfe, 0xfd], &secret()).unwrap();
    let id = derive_entry_id(&p, &secret()).unwrap();
    transport
        .insert_raw(Feature::Accounts, id.to_hex(), blob.to_json().unwrap())
        .await;

    let err = engine
        .get_entry(&p, &secret(), SyncOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_decryption());
}

#[tokio::test]
async fn path_kind_mismatch_is_invalid_path() {
    let (engine, transport) = make_engine(100);

    let err = engine
        .get_entry(&path("networks"), &secret(), SyncOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_invalid_path());

    let err = engine
        .get_all_entries(&path("networks.x"), &secret(), SyncOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_invalid_path());

    let err = engine
        .set_all_entries(
            &path("networks.x"),
            [("a", "1")],
            &secret(),
            SyncOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(err.is_invalid_path());

    assert_eq!(transport.request_count(), 0);
}

// ── Deletes ──────────────────────────────────────────────────────

#[tokio::test]
async fn delete_missing_entry() {
    let (engine, _) = make_engine(100);
    let p = path("addressBook.nobody");

    let err = engine
        .delete_entry(&p, &secret(), SyncOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    engine
        .delete_entry(&p, &secret(), SyncOptions::default().ignore_not_found())
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_entry_removes_it() {
    let (engine, _) = make_engine(100);
    let p = path("addressBook.alice");

    engine.set_entry(&p, "0x1", &secret()).await.unwrap();
    engine
        .delete_entry(&p, &secret(), SyncOptions::default())
        .await
        .unwrap();

    let err = engine
        .get_entry(&p, &secret(), SyncOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_entries_chunks_by_batch_size() {
    let (engine, transport) = make_engine(2);
    let ns = path("networks");
    let entries: Vec<(String, String)> = (0..5).map(|i| (format!("k{i}"), format!("v{i}"))).collect();

    engine
        .set_all_entries(&ns, entries, &secret(), SyncOptions::default())
        .await
        .unwrap();
    let before = transport.request_count();

    engine
        .delete_entries(&ns, ["k0", "k1", "k2"], &secret())
        .await
        .unwrap();

    assert_eq!(transport.request_count() - before, 2);
    assert_eq!(transport.len(Feature::Networks).await, 2);
}

#[tokio::test]
async fn delete_all_entries() {
    let (engine, transport) = make_engine(100);
    let ns = path("accounts");

    engine
        .set_all_entries(&ns, [("a", "1"), ("b", "2")], &secret(), SyncOptions::default())
        .await
        .unwrap();
    engine
        .delete_all_entries(&ns, SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(transport.len(Feature::Accounts).await, 0);

    let err = engine
        .delete_all_entries(&ns, SyncOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    engine
        .delete_all_entries(&ns, SyncOptions::default().ignore_not_found())
        .await
        .unwrap();
}

// ── Namespace reads and writes ───────────────────────────────────

#[tokio::test]
async fn set_all_then_get_all() {
    let (engine, _) = make_engine(100);
    let ns = path("accounts");

    let write = engine
        .set_all_entries(&ns, [("a", "1"), ("b", "2")], &secret(), SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(write.written, 2);
    assert_eq!(write.requests, 1);
    assert!(write.skipped.is_empty());

    let read = engine
        .get_all_entries(&ns, &secret(), SyncOptions::default())
        .await
        .unwrap();
    let mut values = read.values();
    values.sort();
    assert_eq!(values, vec!["1", "2"]);
    assert!(read.is_complete());
}

#[tokio::test]
async fn get_all_of_empty_namespace() {
    let (engine, _) = make_engine(100);
    let read = engine
        .get_all_entries(&path("addressBook"), &secret(), SyncOptions::default())
        .await
        .unwrap();
    assert!(read.entries.is_empty());
}

#[tokio::test]
async fn set_all_chunks_uploads() {
    let (engine, transport) = make_engine(10);
    let entries: BTreeMap<String, String> = (0..25).map(|i| (format!("k{i}"), format!("v{i}"))).collect();

    let write = engine
        .set_all_entries(&path("notifications"), &entries, &secret(), SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(write.written, 25);
    assert_eq!(write.requests, 3);
    assert_eq!(transport.request_count(), 3);
    assert_eq!(transport.len(Feature::Notifications).await, 25);
}

#[tokio::test]
async fn set_all_repeated_key_keeps_last_value() {
    let (engine, transport) = make_engine(100);
    let ns = path("networks");

    let write = engine
        .set_all_entries(&ns, [("a", "1"), ("a", "2")], &secret(), SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(write.written, 1);
    assert_eq!(transport.len(Feature::Networks).await, 1);

    let value = engine
        .get_entry(&path("networks.a"), &secret(), SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(value.as_deref(), Some("2"));
}

#[tokio::test]
async fn set_all_invalid_key_fails_before_sending() {
    let (engine, transport) = make_engine(100);

    for options in [SyncOptions::default(), SyncOptions::best_effort()] {
        let err = engine
            .set_all_entries(&path("networks"), [("ok", "1"), ("", "2")], &secret(), options)
            .await
            .unwrap_err();
        assert!(err.is_invalid_path());
    }
    assert_eq!(transport.request_count(), 0);
}

/// Refuses to seal one particular value.
struct RefusingCipher {
    inner: SecretCipher,
}

const UNSEALABLE: &str = "unsealable";

impl PayloadCipher for RefusingCipher {
    fn encrypt(&self, plaintext: &[u8], secret: &RootSecret) -> CryptoResult<EncryptedBlob> {
        if plaintext == UNSEALABLE.as_bytes() {
            return Err(CryptoError::Encryption("refused".to_string()));
        }
        self.inner.encrypt(plaintext, secret)
    }

    fn decrypt(&self, blob: &EncryptedBlob, secret: &RootSecret) -> CryptoResult<Vec<u8>> {
        self.inner.decrypt(blob, secret)
    }

    fn current_params(&self) -> &KdfParams {
        self.inner.current_params()
    }
}

fn make_refusing_engine() -> (UserStorageSync, Arc<MemoryTransport>) {
    let transport = Arc::new(MemoryTransport::new());
    let cipher = Arc::new(RefusingCipher {
        inner: SecretCipher::new(fast_params()),
    });
    let engine = UserStorageSync::with_client(
        StorageClient::new(transport.clone(), cipher),
        SyncConfig {
            batch_size: 100,
            kdf: fast_params(),
        },
    );
    (engine, transport)
}

#[tokio::test]
async fn best_effort_set_all_skips_unsealable_entries() {
    let (engine, transport) = make_refusing_engine();
    let ns = path("networks");

    let write = engine
        .set_all_entries(
            &ns,
            [("a", "1"), ("b", UNSEALABLE), ("c", "3")],
            &secret(),
            SyncOptions::best_effort(),
        )
        .await
        .unwrap();

    assert_eq!(write.written, 2);
    assert_eq!(write.requests, 1);
    assert_eq!(write.skipped.len(), 1);
    assert_eq!(write.skipped[0].entry, "b");
    assert!(write.skipped[0].reason.contains("refused"));
    assert_eq!(transport.request_count(), 1);
    assert_eq!(transport.len(Feature::Networks).await, 2);

    let err = engine
        .get_entry(&path("networks.b"), &secret(), SyncOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn strict_set_all_sends_nothing_when_an_entry_cannot_be_sealed() {
    let (engine, transport) = make_refusing_engine();

    let err = engine
        .set_all_entries(
            &path("networks"),
            [("a", "1"), ("b", UNSEALABLE)],
            &secret(),
            SyncOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Client(_)));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn best_effort_set_all_still_fails_on_invalid_key() {
    let (engine, transport) = make_refusing_engine();

    let err = engine
        .set_all_entries(
            &path("networks"),
            [("a", "1"), ("b", UNSEALABLE), ("", "2")],
            &secret(),
            SyncOptions::best_effort(),
        )
        .await
        .unwrap_err();

    assert!(err.is_invalid_path());
    assert_eq!(transport.request_count(), 0);
    assert_eq!(transport.len(Feature::Networks).await, 0);
}

#[tokio::test]
async fn set_all_partial_failure_keeps_sent_chunks() {
    let (engine, transport) = make_engine(2);
    let entries: BTreeMap<String, String> = (0..6).map(|i| (format!("k{i}"), format!("v{i}"))).collect();
    transport.set_write_budget(Some(1));

    let err = engine
        .set_all_entries(&path("accounts"), &entries, &secret(), SyncOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert_eq!(transport.len(Feature::Accounts).await, 2);
}

#[tokio::test]
async fn strict_get_all_fails_on_corrupt_record() {
    let (engine, transport) = make_engine(100);
    let ns = path("networks");
    engine
        .set_all_entries(&ns, [("a", "1"), ("b", "2")], &secret(), SyncOptions::default())
        .await
        .unwrap();
    transport
        .insert_raw(Feature::Networks, "c".repeat(64), "{not an envelope")
        .await;

    let err = engine
        .get_all_entries(&ns, &secret(), SyncOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_decryption());
}

#[tokio::test]
async fn best_effort_get_all_skips_corrupt_record() {
    let (engine, transport) = make_engine(100);
    let ns = path("networks");
    engine
        .set_all_entries(&ns, [("a", "1"), ("b", "2")], &secret(), SyncOptions::default())
        .await
        .unwrap();
    let corrupt = "c".repeat(64);
    transport
        .insert_raw(Feature::Networks, corrupt.clone(), "{not an envelope")
        .await;

    let read = engine
        .get_all_entries(&ns, &secret(), SyncOptions::best_effort())
        .await
        .unwrap();

    let mut values = read.values();
    values.sort();
    assert_eq!(values, vec!["1", "2"]);
    assert_eq!(read.skipped.len(), 1);
    assert_eq!(read.skipped[0].entry, corrupt);
    assert!(!read.is_complete());
}

// ── Stale blobs ──────────────────────────────────────────────────

#[tokio::test]
async fn stale_salt_is_rewritten_on_get() {
    let (engine, transport) = make_engine(100);
    let s = secret();
    plant_stale(&transport, "notifications.legacy", "old-value", &s, true).await;
    assert!(stored_blob(&transport, "notifications.legacy", &s)
        .await
        .is_stale(&fast_params()));

    let value = engine
        .get_entry(&path("notifications.legacy"), &s, SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(value.as_deref(), Some("old-value"));

    let rewritten = stored_blob(&transport, "notifications.legacy", &s).await;
    assert!(!rewritten.is_stale(&fast_params()));
    assert!(rewritten.salt.is_shared());
}

#[tokio::test]
async fn stale_params_are_rewritten_on_get_all() {
    let (engine, transport) = make_engine(100);
    let s = secret();
    plant_stale(&transport, "accounts.one", "1", &s, false).await;
    engine
        .set_entry(&path("accounts.two"), "2", &s)
        .await
        .unwrap();

    let read = engine
        .get_all_entries(&path("accounts"), &s, SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(read.entries.len(), 2);
    assert_eq!(read.reencrypted, 1);

    let rewritten = stored_blob(&transport, "accounts.one", &s).await;
    assert_eq!(rewritten.params, fast_params());
}

#[tokio::test]
async fn stale_rewrite_can_be_disabled() {
    let (engine, transport) = make_engine(100);
    let s = secret();
    plant_stale(&transport, "networks.legacy", "x", &s, true).await;
    let before = transport.request_count();

    engine
        .get_entry(
            &path("networks.legacy"),
            &s,
            SyncOptions::default().without_reencryption(),
        )
        .await
        .unwrap();

    assert_eq!(transport.request_count() - before, 1);
    assert!(stored_blob(&transport, "networks.legacy", &s)
        .await
        .is_stale(&fast_params()));
}

#[tokio::test]
async fn failed_stale_rewrite_fails_the_read() {
    let (engine, transport) = make_engine(100);
    let s = secret();
    plant_stale(&transport, "networks.legacy", "x", &s, true).await;
    transport.set_write_budget(Some(0));

    let err = engine
        .get_entry(&path("networks.legacy"), &s, SyncOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn stale_record_with_malformed_key_is_read_but_not_rewritten() {
    let (engine, transport) = make_engine(100);
    let s = secret();
    engine
        .set_entry(&path("networks.fresh"), "1", &s)
        .await
        .unwrap();
    let legacy = SecretCipher::new(fast_params())
        .encrypt_with_salt(b"legacy", &s, Salt::random())
        .unwrap()
        .to_json()
        .unwrap();
    transport
        .insert_raw(Feature::Networks, "HASHED_KEY", legacy.clone())
        .await;

    for options in [SyncOptions::default(), SyncOptions::best_effort()] {
        let read = engine
            .get_all_entries(&path("networks"), &s, options)
            .await
            .unwrap();
        let mut values = read.values();
        values.sort();
        assert_eq!(values, vec!["1", "legacy"]);
        assert_eq!(read.reencrypted, 0);
        assert!(read.is_complete());
    }
    assert_eq!(
        transport.raw(Feature::Networks, "HASHED_KEY").await.as_deref(),
        Some(legacy.as_str())
    );
}

/// Stores `value` at `p` with one envelope KDF field overwritten.
async fn plant_with_kdf_field(transport: &MemoryTransport, p: &str, field: &str, cost: u32) {
    let p = path(p);
    let json = SecretCipher::new(fast_params())
        .encrypt_to_string(b"value", &secret())
        .unwrap();
    let mut envelope: serde_json::Value = serde_json::from_str(&json).unwrap();
    envelope["o"][field] = cost.into();
    let id = derive_entry_id(&p, &secret()).unwrap();
    transport
        .insert_raw(p.feature(), id.to_hex(), envelope.to_string())
        .await;
}

#[tokio::test]
async fn zero_kdf_costs_are_decryption_errors() {
    for field in ["m", "t"] {
        let (engine, transport) = make_engine(100);
        plant_with_kdf_field(&transport, "accounts.broken", field, 0).await;

        let err = engine
            .get_entry(&path("accounts.broken"), &secret(), SyncOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_decryption(), "{field}=0 gave {err:?}");

        let read = engine
            .get_all_entries(&path("accounts"), &secret(), SyncOptions::best_effort())
            .await
            .unwrap();
        assert_eq!(read.skipped.len(), 1);
    }
}

// ── Reconcile ────────────────────────────────────────────────────

fn local(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn reconcile_uploads_missing_and_changed() {
    let (engine, _) = make_engine(100);
    let ns = path("addressBook");
    let s = secret();
    engine
        .set_all_entries(&ns, [("alice", "0x1"), ("bob", "0x2")], &s, SyncOptions::default())
        .await
        .unwrap();

    let report = engine
        .reconcile_feature(
            &ns,
            &local(&[("alice", "0x1"), ("bob", "0x3"), ("carol", "0x4")]),
            &s,
            false,
            SyncOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(report.uploaded, 2);
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.pruned, 0);
    assert_eq!(report.write_requests, 1);

    let bob = engine
        .get_entry(&path("addressBook.bob"), &s, SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(bob.as_deref(), Some("0x3"));
}

#[tokio::test]
async fn reconcile_prunes_remote_only_entries() {
    let (engine, transport) = make_engine(100);
    let ns = path("addressBook");
    let s = secret();
    engine
        .set_all_entries(&ns, [("alice", "0x1"), ("bob", "0x2")], &s, SyncOptions::default())
        .await
        .unwrap();

    let keep = engine
        .reconcile_feature(&ns, &local(&[("alice", "0x1")]), &s, false, SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(keep.pruned, 0);
    assert_eq!(transport.len(Feature::AddressBook).await, 2);

    let pruned = engine
        .reconcile_feature(&ns, &local(&[("alice", "0x1")]), &s, true, SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(pruned.pruned, 1);
    assert_eq!(pruned.uploaded, 0);
    assert_eq!(transport.len(Feature::AddressBook).await, 1);
}

#[tokio::test]
async fn reconcile_in_sync_sends_nothing() {
    let (engine, transport) = make_engine(100);
    let ns = path("networks");
    let s = secret();
    let map = local(&[("a", "1"), ("b", "2")]);
    engine
        .set_all_entries(&ns, &map, &s, SyncOptions::default())
        .await
        .unwrap();
    let before = transport.request_count();

    let report = engine
        .reconcile_feature(&ns, &map, &s, true, SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(report.unchanged, 2);
    assert_eq!(report.write_requests, 0);
    // Only the namespace read.
    assert_eq!(transport.request_count() - before, 1);
}

#[tokio::test]
async fn reconcile_rewrites_stale_entries() {
    let (engine, transport) = make_engine(100);
    let s = secret();
    plant_stale(&transport, "networks.a", "1", &s, true).await;

    let report = engine
        .reconcile_feature(&path("networks"), &local(&[("a", "1")]), &s, false, SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(report.uploaded, 1);
    assert!(!stored_blob(&transport, "networks.a", &s)
        .await
        .is_stale(&fast_params()));
}

#[tokio::test]
async fn reconcile_best_effort_repairs_corrupt_records() {
    let (engine, transport) = make_engine(100);
    let s = secret();
    let ns = path("networks");
    let id = derive_entry_id(&path("networks.a"), &s).unwrap();
    transport
        .insert_raw(Feature::Networks, id.to_hex(), "{not an envelope")
        .await;

    let err = engine
        .reconcile_feature(&ns, &local(&[("a", "1")]), &s, false, SyncOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_decryption());

    let report = engine
        .reconcile_feature(&ns, &local(&[("a", "1")]), &s, false, SyncOptions::best_effort())
        .await
        .unwrap();
    assert_eq!(report.uploaded, 1);
    assert_eq!(report.skipped.len(), 1);

    let value = engine
        .get_entry(&path("networks.a"), &s, SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(value.as_deref(), Some("1"));
}

#[tokio::test]
async fn reconcile_rejects_invalid_local_key() {
    let (engine, transport) = make_engine(100);
    let err = engine
        .reconcile_feature(
            &path("networks"),
            &local(&[("a.b", "1")]),
            &secret(),
            false,
            SyncOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(err.is_invalid_path());
    assert_eq!(transport.request_count(), 0);
}

// ── Status ───────────────────────────────────────────────────────

#[tokio::test]
async fn status_tracks_last_operation() {
    let (engine, _) = make_engine(100);
    assert!(engine.status(Feature::Networks).is_none());

    engine
        .set_entry(&path("networks.a"), "1", &secret())
        .await
        .unwrap();
    let status = engine.status(Feature::Networks).unwrap();
    assert_eq!(status.operation, SyncOperation::SetEntry);
    assert_eq!(status.status, SyncStatus::Success);
    assert!(status.finished_at.is_some());

    let _ = engine
        .get_entry(&path("networks.missing"), &secret(), SyncOptions::default())
        .await;
    let status = engine.status(Feature::Networks).unwrap();
    assert_eq!(status.operation, SyncOperation::GetEntry);
    assert_eq!(status.status, SyncStatus::Failed);
    assert!(status.error.unwrap().contains("not found"));

    assert!(engine.status(Feature::Accounts).is_none());
}

#[test]
fn error_classification() {
    use userstorage_client::ClientError;
    use userstorage_crypto::CryptoError;

    assert!(SyncError::from(ClientError::NotFound("x".into())).is_not_found());
    assert!(SyncError::from(ClientError::Transport("down".into())).is_transport());
    assert!(SyncError::from(ClientError::Api {
        status: 500,
        body: String::new()
    })
    .is_transport());
    assert!(SyncError::from(ClientError::Crypto(CryptoError::Decryption("tag".into()))).is_decryption());
    assert!(SyncError::from(ClientError::Crypto(CryptoError::InvalidBlob("json".into()))).is_decryption());
    assert!(matches!(
        SyncError::from(ClientError::AuthRequired),
        SyncError::Client(_)
    ));
    assert!(matches!(
        SyncError::from(CryptoError::KeyDerivation("argon2".into())),
        SyncError::Client(_)
    ));
}
