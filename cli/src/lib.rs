//! Command line front-end over the user-storage sync core.
//!
//! Argument parsing and command execution live here so they can be tested
//! without a network; `main.rs` only wires in the HTTP transport and
//! credentials.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;
use userstorage_client::{Env, UserStorageConfig};
use userstorage_crypto::RootSecret;
use userstorage_schema::StoragePath;
use userstorage_sync::{SyncConfig, SyncOptions, UserStorageSync, DEFAULT_BATCH_SIZE};

/// Environment variable holding the bearer token.
pub const TOKEN_ENV: &str = "USERSTORAGE_TOKEN";
/// Environment variable holding the root secret.
pub const SECRET_ENV: &str = "USERSTORAGE_SECRET";

#[derive(Parser, Debug)]
#[command(name = "userstorage")]
#[command(about = "Read and write encrypted user storage")]
pub struct Args {
    /// Deployment environment (dev, uat, prd)
    #[arg(long, default_value = "prd")]
    pub env: Env,

    /// Override the API base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Entries per batch request
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Skip unreadable entries instead of failing the batch
    #[arg(long)]
    pub best_effort: bool,

    /// Treat missing entries as empty
    #[arg(long)]
    pub ignore_missing: bool,

    /// Leave stale blobs as they are when reading
    #[arg(long)]
    pub no_reencrypt: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read one entry (`feature.key`)
    Get { path: String },
    /// Read every entry of a feature
    GetAll { path: String },
    /// Write one entry
    Set { path: String, value: String },
    /// Write several `key=value` entries to a feature
    SetAll {
        path: String,
        #[arg(value_parser = parse_entry, required = true)]
        entries: Vec<(String, String)>,
    },
    /// Delete one entry
    Delete { path: String },
    /// Delete the listed keys of a feature
    DeleteKeys {
        path: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Delete every entry of a feature
    DeleteAll { path: String },
    /// Make a feature match a JSON object of key/value strings
    Reconcile {
        path: String,
        file: PathBuf,
        /// Delete remote entries missing from the file
        #[arg(long)]
        prune: bool,
    },
}

impl Args {
    /// API configuration from `--env`, `--api-url` and `--timeout`.
    pub fn storage_config(&self) -> UserStorageConfig {
        let mut config = UserStorageConfig::for_env(self.env);
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        config.timeout_secs = self.timeout;
        config
    }

    /// Engine configuration from `--batch-size`.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            batch_size: self.batch_size,
            ..SyncConfig::default()
        }
    }

    /// Per-call options from the policy flags.
    pub fn sync_options(&self) -> SyncOptions {
        let mut options = if self.best_effort {
            SyncOptions::best_effort()
        } else {
            SyncOptions::default()
        };
        if self.ignore_missing {
            options = options.ignore_not_found();
        }
        if self.no_reencrypt {
            options = options.without_reencryption();
        }
        options
    }
}

/// Parses a `key=value` argument. The value may itself contain `=`.
pub fn parse_entry(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}

/// Reads a JSON object of string values.
pub fn load_local_entries(file: &Path) -> Result<BTreeMap<String, String>> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))
}

fn parse_path(raw: &str) -> Result<StoragePath> {
    StoragePath::parse(raw).with_context(|| format!("invalid path `{raw}`"))
}

/// Runs one command, writing human-readable results to `out`.
pub async fn run(
    command: &Command,
    engine: &UserStorageSync,
    secret: &RootSecret,
    options: SyncOptions,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Get { path } => {
            let path = parse_path(path)?;
            match engine.get_entry(&path, secret, options).await? {
                Some(value) => writeln!(out, "{value}")?,
                None => writeln!(out, "(not found)")?,
            }
        }
        Command::GetAll { path } => {
            let path = parse_path(path)?;
            let read = engine.get_all_entries(&path, secret, options).await?;
            for entry in &read.entries {
                writeln!(out, "{}\t{}", entry.hashed_key, entry.value)?;
            }
            for skipped in &read.skipped {
                warn!(hashed_key = %skipped.entry, reason = %skipped.reason, "skipped entry");
            }
        }
        Command::Set { path, value } => {
            let path = parse_path(path)?;
            engine.set_entry(&path, value, secret).await?;
            writeln!(out, "stored {path}")?;
        }
        Command::SetAll { path, entries } => {
            let path = parse_path(path)?;
            let write = engine
                .set_all_entries(&path, entries.iter().cloned(), secret, options)
                .await?;
            for skipped in &write.skipped {
                warn!(key = %skipped.entry, reason = %skipped.reason, "skipped entry");
            }
            writeln!(
                out,
                "stored {} entries in {} requests",
                write.written, write.requests
            )?;
        }
        Command::Delete { path } => {
            let path = parse_path(path)?;
            engine.delete_entry(&path, secret, options).await?;
            writeln!(out, "deleted {path}")?;
        }
        Command::DeleteKeys { path, keys } => {
            let path = parse_path(path)?;
            engine.delete_entries(&path, keys, secret).await?;
            writeln!(out, "deleted {} keys from {path}", keys.len())?;
        }
        Command::DeleteAll { path } => {
            let path = parse_path(path)?;
            engine.delete_all_entries(&path, options).await?;
            writeln!(out, "deleted {path}")?;
        }
        Command::Reconcile { path, file, prune } => {
            let path = parse_path(path)?;
            let local = load_local_entries(file)?;
            let report = engine
                .reconcile_feature(&path, &local, secret, *prune, options)
                .await?;
            writeln!(
                out,
                "uploaded {} unchanged {} pruned {}",
                report.uploaded, report.unchanged, report.pruned
            )?;
        }
    }
    Ok(())
}
