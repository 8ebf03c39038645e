//! Presence cache: the marker directory, its in-memory index, and the
//! operations that keep the two consistent

use crate::error::Result;
use crate::gate::MutationGate;
use crate::index::PresenceIndex;
use crate::store::MarkerStore;
use crate::types::{is_valid_name, validate_name, CacheStats, CommitReport, ReconcileReport};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// A capacity-bounded set of names mirrored by a directory of markers
pub struct PresenceCache {
    store: MarkerStore,
    index: RwLock<PresenceIndex>,
    gate: MutationGate,
    /// Maximum number of markers kept after a reconciliation pass
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    reconciliations: AtomicU64,
    last_reconciled_at: RwLock<Option<DateTime<Utc>>>,
}

impl PresenceCache {
    pub fn new(dir: PathBuf, capacity: usize) -> Self {
        Self {
            store: MarkerStore::new(dir),
            index: RwLock::new(PresenceIndex::new()),
            gate: MutationGate::new(),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            reconciliations: AtomicU64::new(0),
            last_reconciled_at: RwLock::new(None),
        }
    }

    /// Create the marker directory and load the index from it
    pub async fn init(&self) -> Result<ReconcileReport> {
        self.store.init().await?;
        let report = self.reconcile().await?.unwrap_or_default();
        info!(
            dir = ?self.store.dir(),
            entries = report.entries,
            capacity = self.capacity,
            "Presence cache initialized"
        );
        Ok(report)
    }

    pub fn store(&self) -> &MarkerStore {
        &self.store
    }

    pub fn gate(&self) -> &MutationGate {
        &self.gate
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Rebuild the index from disk and evict the least recently touched
    /// markers beyond capacity.
    ///
    /// The index is replaced once, after eviction, so readers see either the
    /// previous contents or the final ones. Returns `Ok(None)` without doing
    /// anything if a request is mutating the cache or another pass is
    /// running. A failure to read the directory leaves the previous index in
    /// place.
    pub async fn reconcile(&self) -> Result<Option<ReconcileReport>> {
        let Some(_pass) = self.gate.try_enter_reconcile() else {
            debug!("Reconciliation suppressed, mutation in progress");
            return Ok(None);
        };

        let names = self.store.enumerate().await?;
        debug!(entries = names.len(), capacity = self.capacity, "Enumerated markers");

        let (kept, evicted) = if names.len() > self.capacity {
            self.evict_excess(names).await
        } else {
            (names, Vec::new())
        };

        let entries = kept.len();
        self.index.write().await.rebuild(kept);
        self.reconciliations.fetch_add(1, Ordering::Relaxed);
        *self.last_reconciled_at.write().await = Some(Utc::now());

        Ok(Some(ReconcileReport { entries, evicted }))
    }

    /// Delete the oldest markers among `names` until at most `capacity`
    /// remain. Returns `(kept, evicted)`, with `kept` in the input order.
    ///
    /// Names that can't be stat'ed are treated as already gone and are in
    /// neither list. Markers whose delete fails are kept.
    async fn evict_excess(&self, names: Vec<String>) -> (Vec<String>, Vec<String>) {
        let mut stats = self.store.stat_all(&names).await;

        // Oldest first, ties by name so eviction is reproducible
        stats.sort_by(|a, b| {
            a.modified
                .cmp(&b.modified)
                .then_with(|| a.name.cmp(&b.name))
        });
        let excess = stats.len().saturating_sub(self.capacity);

        let mut evicted = Vec::with_capacity(excess);
        for stat in stats.iter().take(excess) {
            debug!(name = %stat.name, "Evicting marker");
            match self.store.remove(&stat.name).await {
                Ok(()) => evicted.push(stat.name.clone()),
                Err(e) => warn!(name = %stat.name, error = %e, "Failed to evict marker"),
            }
        }

        let dropped: HashSet<&str> = evicted.iter().map(String::as_str).collect();
        let present: HashSet<&str> = stats
            .iter()
            .map(|s| s.name.as_str())
            .filter(|n| !dropped.contains(n))
            .collect();
        let kept: Vec<String> = names
            .iter()
            .filter(|n| present.contains(n.as_str()))
            .cloned()
            .collect();

        self.evictions.fetch_add(evicted.len() as u64, Ordering::Relaxed);
        info!(evicted = evicted.len(), capacity = self.capacity, "Evicted oldest markers");
        (kept, evicted)
    }

    /// Request a reconciliation after the directory changed underneath us.
    ///
    /// Dropped while a request is mutating the cache, and coalesced while a
    /// pass is already pending. Otherwise waits `settle` and then runs a pass.
    /// Returns whether a pass was scheduled.
    pub fn schedule_reconcile(self: &Arc<Self>, settle: Duration) -> bool {
        if self.gate.is_mutating() {
            debug!("Change notification ignored, mutation in progress");
            return false;
        }
        if !self.gate.try_mark_pending() {
            return false;
        }

        let cache = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(settle).await;
            cache.gate.clear_pending();
            if let Err(e) = cache.reconcile().await {
                error!(error = %e, "Reconciliation failed");
            }
        });
        true
    }

    /// All known names in discovery order.
    ///
    /// A point-in-time snapshot; it does not wait for running requests.
    pub async fn list(&self) -> Vec<String> {
        self.index.read().await.snapshot()
    }

    /// Delete every known marker and empty the index. Returns how many
    /// markers were removed.
    pub async fn clear(&self) -> usize {
        let _guard = self.gate.enter_mutation().await;

        let names = self.index.write().await.clear();
        let removed = self.store.remove_all(&names).await;
        info!(cleared = removed.len(), "Cleared entries");
        removed.len()
    }

    /// Check each name in order, refreshing the ones that are present.
    ///
    /// Returns one `1` or `0` per input name.
    pub async fn query(&self, names: &[String]) -> String {
        let _guard = self.gate.enter_mutation().await;

        let mut answer = String::with_capacity(names.len());
        for name in names {
            let present = is_valid_name(name) && self.index.read().await.contains(name);
            if present {
                if let Err(e) = self.store.touch(name).await {
                    warn!(name = %name, error = %e, "Failed to refresh marker");
                }
                self.hits.fetch_add(1, Ordering::Relaxed);
                answer.push('1');
            } else {
                self.misses.fetch_add(1, Ordering::Relaxed);
                answer.push('0');
            }
        }

        debug!(names = names.len(), answer = %answer, "Query");
        answer
    }

    /// Ensure each name is present and refreshed.
    ///
    /// The whole request is refused if any name is invalid. Individual write
    /// failures are logged, reported, and do not stop the rest of the batch.
    pub async fn commit(&self, names: &[String]) -> Result<CommitReport> {
        for name in names {
            validate_name(name)?;
        }

        let _guard = self.gate.enter_mutation().await;

        let mut report = CommitReport::default();
        for name in names {
            match self.store.touch(name).await {
                Ok(()) => {
                    self.index.write().await.insert(name);
                    report.committed += 1;
                }
                Err(e) => {
                    warn!(name = %name, error = %e, "Failed to write marker");
                    report.failed.push(name.clone());
                }
            }
        }

        debug!(committed = report.committed, failed = report.failed.len(), "Commit");
        Ok(report)
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.index.read().await.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            reconciliations: self.reconciliations.load(Ordering::Relaxed),
            last_reconciled_at: *self.last_reconciled_at.read().await,
        }
    }
}
