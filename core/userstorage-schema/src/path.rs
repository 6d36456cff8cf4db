//! Two-level storage paths (`feature` / `feature.key`).

use crate::{Feature, InvalidPathError, PathResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the feature and key segments.
pub const PATH_SEPARATOR: char = '.';

/// A validated storage path.
///
/// `FeatureOnly` addresses a whole namespace (bulk operations);
/// `FeatureAndKey` addresses a single entry. The entry variant wraps an
/// [`EntryPath`] whose fields are private, so a `StoragePath` can only come
/// out of [`StoragePath::parse`] or the typed constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StoragePath {
    FeatureOnly(Feature),
    FeatureAndKey(EntryPath),
}

/// The `feature.key` half of [`StoragePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryPath {
    feature: Feature,
    key: String,
}

impl EntryPath {
    /// Returns the feature namespace.
    pub fn feature(&self) -> Feature {
        self.feature
    }

    /// Returns the key segment.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl StoragePath {
    /// Parses `feature` or `feature.key`.
    ///
    /// Rejects empty input, unknown features, empty keys and more than one
    /// separator.
    pub fn parse(raw: &str) -> PathResult<Self> {
        if raw.is_empty() {
            return Err(InvalidPathError::Empty);
        }

        let mut segments = raw.split(PATH_SEPARATOR);
        let feature_segment = segments.next().unwrap_or_default();
        let key_segment = segments.next();
        if segments.next().is_some() {
            return Err(InvalidPathError::TooManySeparators(raw.to_string()));
        }

        let feature = Feature::from_str(feature_segment)?;
        match key_segment {
            None => Ok(StoragePath::FeatureOnly(feature)),
            Some("") => Err(InvalidPathError::EmptyKey(raw.to_string())),
            Some(key) => Ok(StoragePath::FeatureAndKey(EntryPath {
                feature,
                key: key.to_string(),
            })),
        }
    }

    /// A path naming a whole feature namespace.
    pub fn feature_only(feature: Feature) -> Self {
        StoragePath::FeatureOnly(feature)
    }

    /// A path naming a single entry. Applies the same key rules as `parse`.
    pub fn entry(feature: Feature, key: impl Into<String>) -> PathResult<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(InvalidPathError::EmptyKey(format!("{feature}{PATH_SEPARATOR}")));
        }
        if key.contains(PATH_SEPARATOR) {
            return Err(InvalidPathError::TooManySeparators(format!(
                "{feature}{PATH_SEPARATOR}{key}"
            )));
        }
        Ok(StoragePath::FeatureAndKey(EntryPath { feature, key }))
    }

    /// True for a whole-namespace path.
    pub fn is_feature_only(&self) -> bool {
        matches!(self, StoragePath::FeatureOnly(_))
    }

    /// True for a single-entry path.
    pub fn is_feature_and_key(&self) -> bool {
        matches!(self, StoragePath::FeatureAndKey(_))
    }

    /// Returns the feature namespace of either variant.
    pub fn feature(&self) -> Feature {
        match self {
            StoragePath::FeatureOnly(feature) => *feature,
            StoragePath::FeatureAndKey(entry) => entry.feature,
        }
    }

    /// The key segment, if this is an entry path.
    pub fn key(&self) -> Option<&str> {
        match self {
            StoragePath::FeatureOnly(_) => None,
            StoragePath::FeatureAndKey(entry) => Some(&entry.key),
        }
    }

    /// Borrows the entry half, failing for feature-only paths.
    pub fn expect_entry(&self) -> PathResult<&EntryPath> {
        match self {
            StoragePath::FeatureAndKey(entry) => Ok(entry),
            StoragePath::FeatureOnly(_) => Err(InvalidPathError::ExpectedEntry(self.to_string())),
        }
    }

    /// Returns the feature, failing for entry paths.
    pub fn expect_feature_only(&self) -> PathResult<Feature> {
        match self {
            StoragePath::FeatureOnly(feature) => Ok(*feature),
            StoragePath::FeatureAndKey(_) => {
                Err(InvalidPathError::ExpectedFeatureOnly(self.to_string()))
            }
        }
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoragePath::FeatureOnly(feature) => write!(f, "{feature}"),
            StoragePath::FeatureAndKey(entry) => {
                write!(f, "{}{PATH_SEPARATOR}{}", entry.feature, entry.key)
            }
        }
    }
}

impl FromStr for StoragePath {
    type Err = InvalidPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StoragePath::parse(s)
    }
}

impl TryFrom<String> for StoragePath {
    type Error = InvalidPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StoragePath::parse(&value)
    }
}

impl From<StoragePath> for String {
    fn from(path: StoragePath) -> Self {
        path.to_string()
    }
}
