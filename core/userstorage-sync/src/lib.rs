//! Sync core for encrypted user storage.
//!
//! [`UserStorageSync`] is what callers use. It sits on top of
//! [`userstorage_client::StorageClient`] and adds:
//!
//! - **Batch policy**: multi-entry reads and writes fail as a unit unless the
//!   caller opts into [`BatchMode::BestEffort`]
//! - **Chunking**: bulk uploads and deletes are split by
//!   [`SyncConfig::batch_size`]
//! - **Stale rewrite**: blobs written with an old salt or old KDF parameters
//!   are re-encrypted on read
//! - **Reconciliation**: [`UserStorageSync::reconcile_feature`] diffs a local
//!   map against a remote namespace
//! - **Status**: the outcome of the last operation per feature
//!
//! Concurrent callers are not serialized; the remote service is
//! last-write-wins. Nothing is retried.

mod engine;
mod error;
mod options;
mod report;
mod status;

pub use engine::UserStorageSync;
pub use error::{SyncError, SyncResult};
pub use options::{BatchMode, NotFoundPolicy, SyncConfig, SyncOptions, DEFAULT_BATCH_SIZE};
pub use report::{BatchRead, BatchWrite, RemoteEntry, SkippedEntry, SyncReport};
pub use status::{FeatureStatus, StatusTracker, SyncOperation, SyncStatus};
