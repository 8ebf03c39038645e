//! Directory of zero-byte marker files
//!
//! Each tracked name is a regular file directly under the backing directory.
//! The file's modification time is the entry's recency.

use crate::error::Result;
use crate::types::{validate_name, MarkerStat};
use filetime::FileTime;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Create/stat/delete/enumerate operations against the marker directory
#[derive(Debug, Clone)]
pub struct MarkerStore {
    dir: PathBuf,
}

impl MarkerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ensure the marker directory exists
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    fn marker_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// List the names of all markers, sorted by name
    pub async fn enumerate(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            match entry.file_type().await {
                Ok(file_type) if file_type.is_file() => {}
                Ok(_) => {
                    debug!(path = ?entry.path(), "Skipping non-file directory entry");
                    continue;
                }
                Err(e) => {
                    warn!(path = ?entry.path(), error = %e, "Couldn't read file type");
                    continue;
                }
            }

            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => warn!(name = ?raw, "Skipping marker with non-UTF-8 name"),
            }
        }

        names.sort();
        Ok(names)
    }

    /// Create the marker if absent and set its modification time to now
    pub async fn touch(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let path = self.marker_path(name);

        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        tokio::task::spawn_blocking(move || filetime::set_file_mtime(&path, FileTime::now()))
            .await
            .map_err(std::io::Error::other)??;

        Ok(())
    }

    /// Delete a marker. An already-absent marker counts as removed.
    pub async fn remove(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        match fs::remove_file(self.marker_path(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every given marker, returning the names actually removed
    pub async fn remove_all(&self, names: &[String]) -> Vec<String> {
        let mut removed = Vec::with_capacity(names.len());

        for name in names {
            match self.remove(name).await {
                Ok(()) => removed.push(name.clone()),
                Err(e) => warn!(name = %name, error = %e, "Failed to remove marker"),
            }
        }

        removed
    }

    /// Modification time for each name. Names that can't be stat'ed are
    /// logged and left out.
    pub async fn stat_all(&self, names: &[String]) -> Vec<MarkerStat> {
        let mut stats = Vec::with_capacity(names.len());

        for name in names {
            let modified = match fs::metadata(self.marker_path(name)).await {
                Ok(meta) => meta.modified(),
                Err(e) => Err(e),
            };

            match modified {
                Ok(modified) => stats.push(MarkerStat {
                    name: name.clone(),
                    modified,
                }),
                Err(e) => warn!(name = %name, error = %e, "Couldn't stat marker"),
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarkerIndexError;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    fn set_mtime(store: &MarkerStore, name: &str, secs: i64) {
        filetime::set_file_mtime(store.dir().join(name), FileTime::from_unix_time(secs, 0))
            .unwrap();
    }

    #[tokio::test]
    async fn test_init_creates_nested_directory() {
        let dir = tempdir().unwrap();
        let store = MarkerStore::new(dir.path().join("a").join("b"));

        store.init().await.unwrap();
        assert!(store.dir().is_dir());

        // Existing directory is fine
        store.init().await.unwrap();
    }

    #[tokio::test]
    async fn test_touch_creates_empty_marker() {
        let dir = tempdir().unwrap();
        let store = MarkerStore::new(dir.path());

        store.touch("abc123").await.unwrap();

        let meta = std::fs::metadata(dir.path().join("abc123")).unwrap();
        assert!(meta.is_file());
        assert_eq!(meta.len(), 0);
    }

    #[tokio::test]
    async fn test_touch_refreshes_mtime() {
        let dir = tempdir().unwrap();
        let store = MarkerStore::new(dir.path());

        store.touch("entry").await.unwrap();
        set_mtime(&store, "entry", 1_000);

        store.touch("entry").await.unwrap();

        let modified = std::fs::metadata(dir.path().join("entry"))
            .unwrap()
            .modified()
            .unwrap();
        let age = SystemTime::now().duration_since(modified).unwrap_or_default();
        assert!(age < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_touch_rejects_invalid_name() {
        let dir = tempdir().unwrap();
        let store = MarkerStore::new(dir.path().join("inner"));
        store.init().await.unwrap();

        let result = store.touch("../outside").await;
        assert!(matches!(result, Err(MarkerIndexError::InvalidName(_))));
        assert!(!dir.path().join("outside").exists());
    }

    #[tokio::test]
    async fn test_enumerate_lists_files_sorted() {
        let dir = tempdir().unwrap();
        let store = MarkerStore::new(dir.path());

        store.touch("c").await.unwrap();
        store.touch("a").await.unwrap();
        store.touch("b").await.unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();

        let names = store.enumerate().await.unwrap();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_enumerate_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let store = MarkerStore::new(dir.path().join("missing"));

        assert!(store.enumerate().await.is_err());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = MarkerStore::new(dir.path());

        store.touch("gone").await.unwrap();
        store.remove("gone").await.unwrap();
        assert!(!dir.path().join("gone").exists());

        // Already absent
        store.remove("gone").await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_all() {
        let dir = tempdir().unwrap();
        let store = MarkerStore::new(dir.path());

        store.touch("x").await.unwrap();
        store.touch("y").await.unwrap();

        let names = vec!["x".to_string(), "y".to_string(), "never".to_string()];
        let removed = store.remove_all(&names).await;

        assert_eq!(removed, names);
        assert!(store.enumerate().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stat_all_skips_missing() {
        let dir = tempdir().unwrap();
        let store = MarkerStore::new(dir.path());

        store.touch("old").await.unwrap();
        store.touch("new").await.unwrap();
        set_mtime(&store, "old", 1_000);
        set_mtime(&store, "new", 2_000);

        let names = vec!["old".to_string(), "missing".to_string(), "new".to_string()];
        let stats = store.stat_all(&names).await;

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].name, "old");
        assert_eq!(stats[1].name, "new");
        assert!(stats[0].modified < stats[1].modified);
    }
}
