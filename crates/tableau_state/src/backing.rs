//! Backing store implementations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tableau_error::{ConfigError, JsonError, TableauResult, PersistenceError};
use tableau_interface::BackingStore;
use tracing::debug;

/// In-memory key/value store.
///
/// Clones share the same map, so a test can hand one clone to a store,
/// drop the store, and build a fresh one against another clone to simulate
/// a reload.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackingStore {
    label: String,
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackingStore {
    /// Creates an empty store labelled for logs.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: Arc::default(),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BackingStore for MemoryBackingStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Key/value store persisted as a single JSON object on disk.
///
/// The whole map is loaded on open and rewritten on every `set` through a
/// temp file and rename.
#[derive(Debug)]
pub struct FileBackingStore {
    label: String,
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileBackingStore {
    /// Opens (or creates) `<dir>/<label>.json`.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or an existing file
    /// cannot be read or parsed.
    #[tracing::instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
    pub fn open(dir: impl AsRef<Path>, label: &str) -> TableauResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            ConfigError::new(format!(
                "Failed to create state directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let path = dir.join(format!("{}.json", label));
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                ConfigError::new(format!("Failed to read state file: {}", e))
            })?;
            serde_json::from_str(&contents).map_err(|e| {
                JsonError::new(format!("Failed to parse state file: {}", e))
            })?
        } else {
            HashMap::new()
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened file backing store");
        Ok(Self {
            label: label.to_string(),
            path,
            entries: Mutex::new(entries),
        })
    }

    /// File the store writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>, key: &str) -> Result<(), PersistenceError> {
        let contents = serde_json::to_string_pretty(entries)
            .map_err(|e| PersistenceError::new(key, format!("serialize: {}", e)))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)
            .map_err(|e| PersistenceError::new(key, format!("write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            PersistenceError::new(key, format!("rename to {}: {}", self.path.display(), e))
        })
    }
}

impl BackingStore for FileBackingStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries, key)
    }

    fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_clones_share_entries() {
        let store = MemoryBackingStore::new("session");
        let twin = store.clone();
        store.set("k", "v").unwrap();
        assert_eq!(twin.get("k").as_deref(), Some("v"));
        assert_eq!(twin.len(), 1);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileBackingStore::open(dir.path(), "local").unwrap();
            store.set("sim:score", "12").unwrap();
        }
        let reopened = FileBackingStore::open(dir.path(), "local").unwrap();
        assert_eq!(reopened.get("sim:score").as_deref(), Some("12"));
        assert!(reopened.path().ends_with("local.json"));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("local.json"), "{not json").unwrap();
        assert!(FileBackingStore::open(dir.path(), "local").is_err());
    }
}
