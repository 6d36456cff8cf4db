//! Recognized feature namespaces.

use crate::InvalidPathError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A feature namespace under which keyed entries are grouped.
///
/// The wire name is what appears in paths and URLs; it is not always the
/// snake-cased variant name (`accounts_v2`, `addressBook`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    #[serde(rename = "notifications")]
    Notifications,
    #[serde(rename = "accounts_v2")]
    Accounts,
    #[serde(rename = "networks")]
    Networks,
    #[serde(rename = "addressBook")]
    AddressBook,
}

impl Feature {
    /// Every recognized namespace.
    pub const ALL: [Feature; 4] = [
        Feature::Notifications,
        Feature::Accounts,
        Feature::Networks,
        Feature::AddressBook,
    ];

    /// Returns the wire name of this namespace.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Feature::Notifications => "notifications",
            Feature::Accounts => "accounts_v2",
            Feature::Networks => "networks",
            Feature::AddressBook => "addressBook",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = InvalidPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| InvalidPathError::UnknownFeature(s.to_string()))
    }
}
