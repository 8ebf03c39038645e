//! Directory-backed presence index with mtime-based LRU eviction
//!
//! Tracks which names exist as zero-byte marker files in a directory,
//! answers membership queries from an in-memory index, and evicts the least
//! recently touched markers once a capacity is exceeded. Reconciliation
//! against the directory is kept from racing request-driven mutation by a
//! [`MutationGate`].

mod cache;
mod error;
mod gate;
mod index;
mod store;
mod types;

pub use cache::PresenceCache;
pub use error::{MarkerIndexError, Result};
pub use gate::{MutationGate, MutationGuard, ReconcileGuard};
pub use index::PresenceIndex;
pub use store::MarkerStore;
pub use types::{
    is_valid_name, validate_name, CacheStats, CommitReport, MarkerStat, ReconcileReport,
};
