//! Command-line and environment configuration

use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "presence-cache")]
#[command(about = "HTTP presence cache over a directory of marker files", long_about = None)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 6677, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Directory holding one marker file per entry
    #[arg(short, long, env = "DATA_DIR", default_value = "./data")]
    pub dir: PathBuf,

    /// Maximum number of entries kept after each reconciliation
    #[arg(short = 'm', long, env = "MAX_ENTRIES", default_value = "50000")]
    pub max_entries: NonZeroUsize,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Seconds between periodic reconciliations.
    ///
    /// Defaults to one hour, deliberately shorter than the historical 60000
    /// seconds. The directory watch covers changes in between, so this mostly
    /// catches missed notifications.
    #[arg(long, env = "RECONCILE_INTERVAL_SECS", default_value_t = 3600, value_parser = clap::value_parser!(u64).range(1..))]
    pub reconcile_interval_secs: u64,

    /// Quiet period after a directory change before reconciling
    #[arg(long, env = "SETTLE_MILLIS", default_value_t = 1000)]
    pub settle_millis: u64,
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct PresenceCacheConfig {
    pub port: u16,
    pub dir: PathBuf,
    pub capacity: usize,
    pub verbose: bool,
    pub reconcile_interval: Duration,
    pub settle: Duration,
}

impl From<Args> for PresenceCacheConfig {
    fn from(args: Args) -> Self {
        Self {
            port: args.port,
            dir: args.dir,
            capacity: args.max_entries.get(),
            verbose: args.verbose,
            reconcile_interval: Duration::from_secs(args.reconcile_interval_secs),
            settle: Duration::from_millis(args.settle_millis),
        }
    }
}

impl Default for PresenceCacheConfig {
    fn default() -> Self {
        Self {
            port: 6677,
            dir: PathBuf::from("./data"),
            capacity: 50_000,
            verbose: false,
            reconcile_interval: Duration::from_secs(60 * 60),
            settle: Duration::from_secs(1),
        }
    }
}
