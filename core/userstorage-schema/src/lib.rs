//! Storage path schema for encrypted user storage.
//!
//! Every remote entry lives under a two-level address:
//! - `feature`: one of a fixed set of namespaces ([`Feature`])
//! - `feature.key`: a single caller-defined entry inside that namespace
//!
//! Paths are only ever produced by the validating parser (or the typed
//! constructors that apply the same rules), so the rest of the system can
//! match on [`StoragePath`] instead of re-splitting strings.

mod feature;
mod path;

pub use feature::Feature;
pub use path::{EntryPath, StoragePath, PATH_SEPARATOR};

/// Result type alias for path operations.
pub type PathResult<T> = std::result::Result<T, InvalidPathError>;

/// Errors produced while parsing or constructing a storage path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPathError {
    #[error("storage path is empty")]
    Empty,

    #[error("unknown feature namespace: {0}")]
    UnknownFeature(String),

    #[error("empty key segment in path: {0}")]
    EmptyKey(String),

    #[error("too many separators in path (expected 'feature' or 'feature.key'): {0}")]
    TooManySeparators(String),

    #[error("expected a feature.key path, got feature-only path: {0}")]
    ExpectedEntry(String),

    #[error("expected a feature-only path, got entry path: {0}")]
    ExpectedFeatureOnly(String),
}
