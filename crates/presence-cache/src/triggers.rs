//! Background reconciliation triggers
//!
//! A periodic timer and a watch on the marker directory both ask the cache
//! to reconcile. The cache's gate decides whether a pass actually runs.

use crate::error::Result;
use marker_index::PresenceCache;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

/// Reconcile every `period`. The first tick is skipped since startup has
/// just reconciled.
pub fn spawn_periodic(cache: Arc<PresenceCache>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match cache.reconcile().await {
                Ok(Some(report)) => debug!(
                    entries = report.entries,
                    evicted = report.evicted.len(),
                    "Periodic reconciliation complete"
                ),
                Ok(None) => debug!("Periodic reconciliation skipped"),
                Err(e) => error!(error = %e, "Periodic reconciliation failed"),
            }
        }
    })
}

/// Watch the marker directory and schedule a debounced reconciliation on
/// every change.
///
/// The returned watcher must be kept alive for notifications to flow.
pub fn watch_directory(
    cache: Arc<PresenceCache>,
    settle: Duration,
) -> Result<(RecommendedWatcher, JoinHandle<()>)> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let _ = tx.send(event);
        }
        Err(e) => warn!(error = %e, "Directory watch error"),
    })?;
    watcher.watch(cache.store().dir(), RecursiveMode::NonRecursive)?;
    info!(dir = ?cache.store().dir(), "Watching marker directory");

    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            debug!(kind = ?event.kind, paths = ?event.paths, "Directory changed");
            cache.schedule_reconcile(settle);
        }
    });

    Ok((watcher, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_external_marker_is_picked_up() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(PresenceCache::new(dir.path().to_path_buf(), 10));
        cache.init().await.unwrap();

        let (_watcher, handle) =
            watch_directory(cache.clone(), Duration::from_millis(50)).unwrap();

        std::fs::write(dir.path().join("external"), b"").unwrap();

        let mut found = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if cache.list().await.contains(&"external".to_string()) {
                found = true;
                break;
            }
        }
        handle.abort();
        assert!(found, "watcher never reconciled the new marker");
    }

    #[tokio::test]
    async fn test_periodic_reconciliation_evicts() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(PresenceCache::new(dir.path().to_path_buf(), 1));
        cache.init().await.unwrap();
        cache
            .commit(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        let handle = spawn_periodic(cache.clone(), Duration::from_millis(50));

        let mut evicted = false;
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if cache.list().await.len() == 1 {
                evicted = true;
                break;
            }
        }
        handle.abort();
        assert!(evicted, "periodic reconciliation never ran");
    }

    #[tokio::test]
    async fn test_watch_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(PresenceCache::new(dir.path().join("missing"), 1));

        assert!(watch_directory(cache, Duration::from_millis(10)).is_err());
    }
}
