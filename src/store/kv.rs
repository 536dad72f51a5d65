//! String-keyed persisted store
//!
//! The metadata cache tier sits on this seam. The contract is synchronous:
//! reads are served from an in-memory map, writes go through to disk before
//! returning. `FileKvStore` persists the whole map as one JSON snapshot
//! with an atomic temp-file-plus-rename write.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::error::StoreError;

/// String-keyed persisted store with synchronous reads
pub trait KvStore: Send + Sync {
    /// Get the value stored under `key`, if any
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, overwriting any existing value
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove the value stored under `key` (idempotent)
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Serialized snapshot of the store contents
#[derive(Serialize, Deserialize)]
struct KvSnapshot {
    version: u32,
    entries: HashMap<String, String>,
}

/// File-backed `KvStore` holding one JSON snapshot
pub struct FileKvStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileKvStore {
    /// Open a store at `path`, loading any existing snapshot.
    ///
    /// A missing file yields an empty store. A corrupt snapshot is logged
    /// and treated as empty rather than failing the open.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let entries = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<KvSnapshot>(&json) {
                Ok(snapshot) => snapshot.entries,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to parse KV snapshot, starting empty"
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Write the current map to disk atomically (temp file + rename)
    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        let snapshot = KvSnapshot {
            version: 1,
            entries: entries.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, &self.path)?;

        Ok(())
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when no keys are stored
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileKvStore {
        FileKvStore::open(dir.path().join("kv.json")).unwrap()
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.get("nope"), None);
    }

    #[test]
    fn test_set_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.set("alpha", "1").unwrap();
        assert_eq!(store.get("alpha"), Some("1".to_string()));

        // Overwrite
        store.set("alpha", "2").unwrap();
        assert_eq!(store.get("alpha"), Some("2".to_string()));
    }

    #[test]
    fn test_remove_deletes_key_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.set("alpha", "1").unwrap();
        store.remove("alpha").unwrap();
        assert_eq!(store.get("alpha"), None);

        // Removing again is a no-op
        store.remove("alpha").unwrap();
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.json");

        {
            let store = FileKvStore::open(&path).unwrap();
            store.set("alpha", "1").unwrap();
            store.set("beta", "2").unwrap();
        }

        let reopened = FileKvStore::open(&path).unwrap();
        assert_eq!(reopened.get("alpha"), Some("1".to_string()));
        assert_eq!(reopened.get("beta"), Some("2".to_string()));
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_corrupt_snapshot_opens_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.json");
        std::fs::write(&path, "{not json at all").unwrap();

        let store = FileKvStore::open(&path).unwrap();
        assert!(store.is_empty());

        // And the store is writable afterwards
        store.set("alpha", "1").unwrap();
        assert_eq!(store.get("alpha"), Some("1".to_string()));
    }

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileKvStore::open(dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }
}
