//! Storage layer for per-user message counters
//!
//! The whole counter map lives in one pretty-printed JSON file which is read
//! once at startup and rewritten after every handled message.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Mapping from user key to the number of messages processed for that user
pub type CounterMap = BTreeMap<String, u64>;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Error during JSON serialization or deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read the full counter map from `path`.
///
/// A missing file is not an error and yields an empty map.
///
/// # Errors
///
/// Returns `StorageError::Io` if the file exists but cannot be read, or
/// `StorageError::Json` if its content is not a flat object of integers.
pub async fn load_counts(path: &Path) -> Result<CounterMap, StorageError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(CounterMap::new()),
        Err(e) => Err(e.into()),
    }
}

/// Serialize the full counter map to `path`, overwriting it.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub async fn save_counts(path: &Path, counts: &CounterMap) -> Result<(), StorageError> {
    let body = serde_json::to_string_pretty(counts)?;
    tokio::fs::write(path, body).await?;
    Ok(())
}

/// File-backed counter store shared by all message handlers.
///
/// Every update and the save that follows it run under one lock, so two
/// concurrent commits cannot overwrite each other's entry in the file.
pub struct CounterStore {
    path: PathBuf,
    counts: Mutex<CounterMap>,
}

impl CounterStore {
    /// Open the store, loading the existing counter file.
    ///
    /// An unreadable or corrupt file is logged and treated as empty.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let counts = match load_counts(&path).await {
            Ok(counts) => {
                debug!(path = %path.display(), users = counts.len(), "Counters loaded");
                counts
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Cannot read counter file, starting empty"
                );
                CounterMap::new()
            }
        };

        Self {
            path,
            counts: Mutex::new(counts),
        }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Count the next message from `key` would get. Nothing is persisted.
    ///
    /// A counter already at `u64::MAX` stays there.
    pub async fn next_count(&self, key: &str) -> u64 {
        let counts = self.counts.lock().await;
        let current = counts.get(key).copied().unwrap_or(0);
        current.checked_add(1).unwrap_or_else(|| {
            warn!(user = %key, "Counter at its maximum, not incrementing");
            current
        })
    }

    /// Current stored count for `key`
    pub async fn get(&self, key: &str) -> Option<u64> {
        self.counts.lock().await.get(key).copied()
    }

    /// Copy of the whole in-memory map
    pub async fn snapshot(&self) -> CounterMap {
        self.counts.lock().await.clone()
    }

    /// Record `count` for `key` and rewrite the whole file.
    ///
    /// The in-memory value is kept even when the save fails.
    ///
    /// # Errors
    ///
    /// Returns the save error; the caller decides whether to surface it.
    pub async fn commit(&self, key: &str, count: u64) -> Result<(), StorageError> {
        let mut counts = self.counts.lock().await;
        counts.insert(key.to_string(), count);
        save_counts(&self.path, &counts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_loads_empty() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let counts = load_counts(&dir.path().join("absent.json")).await?;
        assert!(counts.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error_but_store_opens_empty(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("counts.json");
        tokio::fs::write(&path, "{not json").await?;

        assert!(matches!(
            load_counts(&path).await,
            Err(StorageError::Json(_))
        ));

        let store = CounterStore::open(&path).await;
        assert!(store.snapshot().await.is_empty());
        assert_eq!(store.next_count("anyone").await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_shape_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("counts.json");
        tokio::fs::write(&path, r#"{"alice": "five"}"#).await?;
        assert!(load_counts(&path).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_then_load_is_identical() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("counts.json");

        let mut counts = CounterMap::new();
        counts.insert("alice".to_string(), 5);
        counts.insert("123456789".to_string(), 12);
        counts.insert("zoé".to_string(), 1);

        save_counts(&path, &counts).await?;
        assert_eq!(load_counts(&path).await?, counts);
        Ok(())
    }

    #[tokio::test]
    async fn test_file_is_pretty_printed_utf8() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("counts.json");

        let mut counts = CounterMap::new();
        counts.insert("zoé".to_string(), 3);
        save_counts(&path, &counts).await?;

        let raw = tokio::fs::read_to_string(&path).await?;
        assert_eq!(raw, "{\n  \"zoé\": 3\n}");
        Ok(())
    }

    #[tokio::test]
    async fn test_next_count_does_not_persist() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("counts.json");
        let store = CounterStore::open(&path).await;

        assert_eq!(store.next_count("alice").await, 1);
        assert_eq!(store.next_count("alice").await, 1);
        assert_eq!(store.get("alice").await, None);
        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_next_count_saturates_at_max() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("counts.json");
        tokio::fs::write(&path, format!(r#"{{"alice": {}}}"#, u64::MAX)).await?;

        let store = CounterStore::open(&path).await;
        assert_eq!(store.get("alice").await, Some(u64::MAX));
        assert_eq!(store.next_count("alice").await, u64::MAX);
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_rewrites_whole_map() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("counts.json");
        tokio::fs::write(&path, r#"{"alice": 5}"#).await?;

        let store = CounterStore::open(&path).await;
        assert_eq!(store.next_count("alice").await, 6);
        store.commit("alice", 6).await?;
        store.commit("bob", 1).await?;

        let on_disk = load_counts(&path).await?;
        assert_eq!(on_disk.get("alice"), Some(&6));
        assert_eq!(on_disk.get("bob"), Some(&1));
        assert_eq!(on_disk.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_save_keeps_memory_value() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        // Parent directory does not exist, so the write fails
        let path = dir.path().join("missing").join("counts.json");
        let store = CounterStore::open(&path).await;

        assert!(matches!(
            store.commit("alice", 1).await,
            Err(StorageError::Io(_))
        ));
        assert_eq!(store.get("alice").await, Some(1));
        assert_eq!(store.next_count("alice").await, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_commits_are_not_lost() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("counts.json");
        let store = std::sync::Arc::new(CounterStore::open(&path).await);

        let mut handles = Vec::new();
        for i in 0..16u64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.commit(&format!("user{i}"), i + 1).await
            }));
        }
        for handle in handles {
            handle.await??;
        }

        let on_disk = load_counts(&path).await?;
        assert_eq!(on_disk.len(), 16);
        assert_eq!(on_disk.get("user15"), Some(&16));
        Ok(())
    }
}
