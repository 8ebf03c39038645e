//! Mutual exclusion between request-driven mutation and reconciliation
//!
//! Request handlers hold the shared side of an `RwLock` for their whole run,
//! so any number of them can proceed together. The reconciler only ever
//! *tries* the exclusive side: if a handler is active the pass is dropped and
//! the next trigger retries. While a reconciliation holds the lock, handlers
//! wait, so they never see a half-rebuilt index.
//!
//! A separate pending token collapses bursts of change notifications into a
//! single delayed pass.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct MutationGate {
    lock: RwLock<()>,
    active_mutations: AtomicUsize,
    reconcile_pending: AtomicBool,
}

/// Held by a request handler while it touches the store or the index
#[must_use]
pub struct MutationGuard<'a> {
    _lock: RwLockReadGuard<'a, ()>,
    active: &'a AtomicUsize,
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Held by the reconciler for a whole pass
#[must_use]
pub struct ReconcileGuard<'a> {
    _lock: RwLockWriteGuard<'a, ()>,
}

impl MutationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for any running reconciliation, then mark a mutation in progress
    pub async fn enter_mutation(&self) -> MutationGuard<'_> {
        let lock = self.lock.read().await;
        self.active_mutations.fetch_add(1, Ordering::AcqRel);
        MutationGuard {
            _lock: lock,
            active: &self.active_mutations,
        }
    }

    /// Admit a reconciliation only if nothing else holds the gate
    pub fn try_enter_reconcile(&self) -> Option<ReconcileGuard<'_>> {
        self.lock
            .try_write()
            .ok()
            .map(|lock| ReconcileGuard { _lock: lock })
    }

    pub fn is_mutating(&self) -> bool {
        self.active_mutations.load(Ordering::Acquire) > 0
    }

    /// Take the pending token. Returns false if a pass is already pending.
    pub fn try_mark_pending(&self) -> bool {
        self.reconcile_pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn clear_pending(&self) {
        self.reconcile_pending.store(false, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.reconcile_pending.load(Ordering::Acquire)
    }
}
