//! Encrypted user-storage command line client
//!
//! Usage:
//!   USERSTORAGE_TOKEN=... USERSTORAGE_SECRET=... userstorage get notifications.settings
//!   userstorage --env uat set-all accounts a=1 b=2
//!
//! The token and secret are only read from the environment.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;
use userstorage_cli::{run, Args, SECRET_ENV, TOKEN_ENV};
use userstorage_client::{HttpTransport, StaticTokenProvider};
use userstorage_crypto::RootSecret;
use userstorage_sync::UserStorageSync;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let token = std::env::var(TOKEN_ENV).with_context(|| format!("{TOKEN_ENV} is not set"))?;
    let secret = RootSecret::from(
        std::env::var(SECRET_ENV).with_context(|| format!("{SECRET_ENV} is not set"))?,
    );

    let config = args.storage_config();
    debug!(api = %config.api_base_url, "using user-storage API");
    let transport = HttpTransport::new(config, Arc::new(StaticTokenProvider::new(token)))?;
    let engine = UserStorageSync::new(Arc::new(transport), args.sync_config());

    let mut stdout = std::io::stdout().lock();
    run(&args.command, &engine, &secret, args.sync_options(), &mut stdout).await
}
