//! Results of multi-entry operations.

/// One decrypted record of a namespace read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub hashed_key: String,
    pub value: String,
}

/// An entry a best-effort operation left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Plaintext key for writes, hashed key for reads.
    pub entry: String,
    pub reason: String,
}

/// Result of [`get_all_entries`](crate::UserStorageSync::get_all_entries).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRead {
    pub entries: Vec<RemoteEntry>,
    /// Always empty in strict mode.
    pub skipped: Vec<SkippedEntry>,
    /// Stale entries rewritten with current parameters.
    pub reencrypted: usize,
}

impl BatchRead {
    /// Decrypted values in read order.
    pub fn values(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.value.as_str()).collect()
    }

    /// True when no record was skipped.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Result of [`set_all_entries`](crate::UserStorageSync::set_all_entries).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchWrite {
    pub written: usize,
    /// Batch requests sent.
    pub requests: usize,
    pub skipped: Vec<SkippedEntry>,
}

/// Result of [`reconcile_feature`](crate::UserStorageSync::reconcile_feature).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Local entries that were missing, different or stale remotely.
    pub uploaded: usize,
    pub unchanged: usize,
    /// Remote-only entries deleted.
    pub pruned: usize,
    /// Upload and delete requests sent, not counting the initial read.
    pub write_requests: usize,
    pub skipped: Vec<SkippedEntry>,
}
