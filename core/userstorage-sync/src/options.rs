//! Engine configuration and per-call options.

use serde::{Deserialize, Serialize};
use userstorage_crypto::KdfParams;

/// Default number of entries per batch upload or delete request.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Engine-wide settings, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum entries per batch request.
    pub batch_size: usize,
    /// Parameters for newly written blobs. Blobs with other parameters are
    /// stale.
    pub kdf: KdfParams,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            kdf: KdfParams::default(),
        }
    }
}

/// How a multi-entry operation treats one entry it cannot encrypt or decrypt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Fail the whole operation.
    #[default]
    Strict,
    /// Skip the entry and report it.
    BestEffort,
}

/// How a missing remote entry or namespace is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundPolicy {
    /// Return [`SyncError::NotFound`](crate::SyncError::NotFound).
    #[default]
    Surface,
    /// Treat as an empty result (or a completed delete).
    Ignore,
}

/// Per-call options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    pub batch_mode: BatchMode,
    pub not_found: NotFoundPolicy,
    /// Rewrite blobs encrypted with an old salt or old KDF parameters when
    /// they are read.
    pub reencrypt_stale: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_mode: BatchMode::Strict,
            not_found: NotFoundPolicy::Surface,
            reencrypt_stale: true,
        }
    }
}

impl SyncOptions {
    /// Default options with [`BatchMode::BestEffort`].
    pub fn best_effort() -> Self {
        Self {
            batch_mode: BatchMode::BestEffort,
            ..Self::default()
        }
    }

    /// Treats missing entries as absent instead of failing.
    pub fn ignore_not_found(mut self) -> Self {
        self.not_found = NotFoundPolicy::Ignore;
        self
    }

    /// Leaves stale blobs as they are on read.
    pub fn without_reencryption(mut self) -> Self {
        self.reencrypt_stale = false;
        self
    }

    pub(crate) fn is_best_effort(&self) -> bool {
        self.batch_mode == BatchMode::BestEffort
    }

    pub(crate) fn ignores_not_found(&self) -> bool {
        self.not_found == NotFoundPolicy::Ignore
    }
}
