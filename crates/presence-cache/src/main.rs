//! Presence cache - shared index of which artifacts exist in a directory
//!
//! Clients ask whether names are present (refreshing the ones that are) and
//! commit new ones, without transferring any payload. Entries beyond the
//! configured capacity are evicted least-recently-touched first.

mod config;
mod error;
mod server;
mod triggers;
mod types;

use crate::config::{Args, PresenceCacheConfig};
use crate::error::Result;
use crate::server::{start_server, ServerState, SharedState};
use clap::Parser;
use marker_index::PresenceCache;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = PresenceCacheConfig::from(Args::parse());

    // Initialize logging
    let level = if config.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(format!("presence_cache={}", level).parse()?)
        .add_directive(format!("marker_index={}", level).parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting presence cache...");
    info!("Port: {}", config.port);
    info!("Data dir: {:?}", config.dir);
    info!("Max entries: {}", config.capacity);
    info!(
        "Reconcile every {:?}, settle {:?}",
        config.reconcile_interval, config.settle
    );

    // Load the index from disk before accepting requests
    let cache = Arc::new(PresenceCache::new(config.dir.clone(), config.capacity));
    cache.init().await?;

    triggers::spawn_periodic(cache.clone(), config.reconcile_interval);
    let (_watcher, _watch_task) = triggers::watch_directory(cache.clone(), config.settle)?;

    let state: SharedState = Arc::new(ServerState::new(cache));

    // Start HTTP server (blocking)
    start_server(state, config.port).await?;

    Ok(())
}
