//! Per-feature operation status.
//!
//! Each operation moves `Pending -> Success | Failed`. Only the most recent
//! operation per feature is kept; a failed operation is retried by calling it
//! again in full.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use userstorage_schema::Feature;

/// Sync-core operations, as recorded in [`FeatureStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    GetEntry,
    GetAllEntries,
    SetEntry,
    SetAllEntries,
    DeleteEntry,
    DeleteEntries,
    DeleteAllEntries,
    Reconcile,
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncOperation::GetEntry => "get_entry",
            SyncOperation::GetAllEntries => "get_all_entries",
            SyncOperation::SetEntry => "set_entry",
            SyncOperation::SetAllEntries => "set_all_entries",
            SyncOperation::DeleteEntry => "delete_entry",
            SyncOperation::DeleteEntries => "delete_entries",
            SyncOperation::DeleteAllEntries => "delete_all_entries",
            SyncOperation::Reconcile => "reconcile",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Pending,
    Success,
    Failed,
}

impl SyncStatus {
    /// True once the operation succeeded or failed.
    pub fn is_finished(&self) -> bool {
        !matches!(self, SyncStatus::Pending)
    }
}

/// The last operation run against a feature namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureStatus {
    pub operation: SyncOperation,
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Error message when `status` is `Failed`.
    pub error: Option<String>,
}

/// Thread-safe map of the latest [`FeatureStatus`] per feature.
#[derive(Debug, Default)]
pub struct StatusTracker {
    features: Mutex<HashMap<Feature, FeatureStatus>>,
}

impl StatusTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `operation` as pending for `feature`.
    pub fn begin(&self, feature: Feature, operation: SyncOperation) {
        let status = FeatureStatus {
            operation,
            status: SyncStatus::Pending,
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        };
        self.lock().insert(feature, status);
    }

    /// Records the outcome of the pending operation for `feature`.
    pub fn finish<T, E: fmt::Display>(
        &self,
        feature: Feature,
        operation: SyncOperation,
        result: &Result<T, E>,
    ) {
        let now = Utc::now();
        let mut features = self.lock();
        let entry = features.entry(feature).or_insert_with(|| FeatureStatus {
            operation,
            status: SyncStatus::Pending,
            started_at: now,
            finished_at: None,
            error: None,
        });
        entry.operation = operation;
        entry.finished_at = Some(now);
        match result {
            Ok(_) => {
                entry.status = SyncStatus::Success;
                entry.error = None;
            }
            Err(e) => {
                entry.status = SyncStatus::Failed;
                entry.error = Some(e.to_string());
            }
        }
    }

    /// Returns the latest status for `feature`.
    pub fn get(&self, feature: Feature) -> Option<FeatureStatus> {
        self.lock().get(&feature).cloned()
    }

    /// Forgets every recorded status.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Feature, FeatureStatus>> {
        self.features.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
