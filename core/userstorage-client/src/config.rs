//! Client configuration.
//!
//! The API location is always injected through [`UserStorageConfig`]; nothing
//! in this crate reads environment variables.

use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Deployment environments with known API locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    Dev,
    Uat,
    #[default]
    Prd,
}

impl Env {
    /// Base URL of the user-storage API in this environment.
    pub const fn user_storage_api_url(&self) -> &'static str {
        match self {
            Env::Dev => "https://user-storage.dev-api.cx.metamask.io",
            Env::Uat => "https://user-storage.uat-api.cx.metamask.io",
            Env::Prd => "https://user-storage.api.cx.metamask.io",
        }
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Env::Dev => "dev",
            Env::Uat => "uat",
            Env::Prd => "prd",
        })
    }
}

impl FromStr for Env {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Env::Dev),
            "uat" => Ok(Env::Uat),
            "prd" | "prod" => Ok(Env::Prd),
            other => Err(ClientError::Config(format!("unknown environment: {other}"))),
        }
    }
}

/// Location and timeouts for the remote API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStorageConfig {
    /// Base URL (e.g. `https://user-storage.api.cx.metamask.io`).
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UserStorageConfig {
    fn default() -> Self {
        Self::for_env(Env::default())
    }
}

impl UserStorageConfig {
    /// Preset for a deployment environment with the default timeout.
    pub fn for_env(env: Env) -> Self {
        Self {
            api_base_url: env.user_storage_api_url().to_string(),
            timeout_secs: 30,
        }
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks the base URL is an absolute http(s) URL and the timeout is set.
    pub fn validate(&self) -> ClientResult<()> {
        let url = url::Url::parse(&self.api_base_url)
            .map_err(|e| ClientError::Config(format!("invalid api_base_url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "unsupported scheme in api_base_url: {}",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// `{base}/api/v1/userstorage`, without a trailing slash.
    pub fn user_storage_root(&self) -> String {
        format!(
            "{}/api/v1/userstorage",
            self.api_base_url.trim_end_matches('/')
        )
    }
}
