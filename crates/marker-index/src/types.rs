//! Index types

use crate::error::{MarkerIndexError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Longest name most filesystems accept for a single path segment
const MAX_NAME_LEN: usize = 255;

/// Check that an entry name can be used as a single marker file name.
///
/// Names become path segments under the backing directory verbatim, so
/// anything that could escape the directory or that the filesystem would
/// reject is refused here.
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);

    if valid {
        Ok(())
    } else {
        Err(MarkerIndexError::InvalidName(name.to_string()))
    }
}

pub fn is_valid_name(name: &str) -> bool {
    validate_name(name).is_ok()
}

/// Modification time of a single marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerStat {
    pub name: String,
    pub modified: SystemTime,
}

/// Outcome of a completed reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Entries left in the index after eviction
    pub entries: usize,
    /// Names evicted during this pass, oldest first
    pub evicted: Vec<String>,
}

/// Outcome of a commit request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    pub committed: usize,
    /// Names whose marker could not be written
    pub failed: Vec<String>,
}

/// Statistics about the presence cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub reconciliations: u64,
    pub last_reconciled_at: Option<DateTime<Utc>>,
}
