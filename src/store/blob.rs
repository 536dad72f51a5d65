//! Keyed persisted store for binary image payloads
//!
//! The blob cache tier sits on this seam. Records carry an auto-incrementing
//! insertion key so the oldest fetched payload is always the next one taken.
//! `DiskBlobStore` keeps one payload file per record plus a JSON index
//! snapshot, written atomically (temp file + rename). All mutating
//! operations run under one async mutex so a take-and-delete is observed
//! by exactly one caller.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::error::StoreError;

/// Keyed, asynchronous persisted store for binary payloads
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Append one record; returns the assigned insertion key
    async fn append(
        &self,
        payload: Bytes,
        photographer: &str,
        profile_url: &str,
        inserted_at_ms: i64,
    ) -> Result<u64, StoreError>;

    /// Read and delete the lowest-keyed record as one logical operation.
    /// Returns None when the store is empty.
    async fn take_first(&self) -> Result<Option<StoredBlob>, StoreError>;

    /// Number of currently stored records
    async fn count(&self) -> Result<u64, StoreError>;

    /// Delete all records and their payloads
    async fn clear(&self) -> Result<(), StoreError>;

    /// Persisted last-refresh timestamp for this store (epoch ms)
    async fn last_refresh_ms(&self) -> Result<Option<i64>, StoreError>;

    /// Set the persisted last-refresh timestamp (epoch ms)
    async fn set_last_refresh_ms(&self, ts_ms: i64) -> Result<(), StoreError>;
}

/// A record taken out of a `BlobStore`. The store's copy is already
/// deleted when this value is handed to the caller.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub key: u64,
    pub payload: Bytes,
    pub photographer: String,
    pub profile_url: String,
    pub inserted_at_ms: i64,
}

/// Index entry for one stored payload
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    key: u64,
    file_name: String,
    photographer: String,
    profile_url: String,
    inserted_at_ms: i64,
    size_bytes: u64,
}

/// Serialized snapshot of the index
#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    version: u32,
    next_key: u64,
    last_refresh_ms: Option<i64>,
    entries: Vec<IndexEntry>,
}

/// In-memory index state, guarded by the store mutex
struct IndexState {
    next_key: u64,
    last_refresh_ms: Option<i64>,
    entries: BTreeMap<u64, IndexEntry>,
}

impl IndexState {
    fn empty() -> Self {
        Self {
            next_key: 0,
            last_refresh_ms: None,
            entries: BTreeMap::new(),
        }
    }
}

/// File-backed `BlobStore`: payload files plus a JSON index
pub struct DiskBlobStore {
    root: PathBuf,
    state: Mutex<IndexState>,
}

impl DiskBlobStore {
    /// Open a store rooted at `root`, loading any existing index.
    ///
    /// A missing index yields an empty store. A corrupt index is logged
    /// and treated as empty rather than failing the open.
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;

        let index_path = root.join("index.json");
        let state = match tokio::fs::read_to_string(&index_path).await {
            Ok(json) => match serde_json::from_str::<IndexSnapshot>(&json) {
                Ok(snapshot) => {
                    let mut entries = BTreeMap::new();
                    for entry in snapshot.entries {
                        entries.insert(entry.key, entry);
                    }
                    IndexState {
                        next_key: snapshot.next_key,
                        last_refresh_ms: snapshot.last_refresh_ms,
                        entries,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        path = %index_path.display(),
                        error = %e,
                        "Failed to parse blob index, starting empty"
                    );
                    IndexState::empty()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IndexState::empty(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            root,
            state: Mutex::new(state),
        })
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn payload_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Persist the index snapshot atomically
    async fn persist_index(&self, state: &IndexState) -> Result<(), StoreError> {
        let snapshot = IndexSnapshot {
            version: 1,
            next_key: state.next_key,
            last_refresh_ms: state.last_refresh_ms,
            entries: state.entries.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        write_file_atomic(&self.index_path(), json.into_bytes()).await
    }
}

/// Write file contents atomically (temp file + rename)
async fn write_file_atomic(path: &Path, data: Vec<u8>) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, &data).await?;
    tokio::fs::rename(&temp_path, path).await?;

    Ok(())
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn append(
        &self,
        payload: Bytes,
        photographer: &str,
        profile_url: &str,
        inserted_at_ms: i64,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;

        let key = state.next_key;
        let file_name = format!("{:016x}.blob", key);
        write_file_atomic(&self.payload_path(&file_name), payload.to_vec()).await?;

        state.next_key += 1;
        state.entries.insert(
            key,
            IndexEntry {
                key,
                file_name,
                photographer: photographer.to_string(),
                profile_url: profile_url.to_string(),
                inserted_at_ms,
                size_bytes: payload.len() as u64,
            },
        );
        self.persist_index(&state).await?;

        Ok(key)
    }

    async fn take_first(&self) -> Result<Option<StoredBlob>, StoreError> {
        let mut state = self.state.lock().await;

        let first_key = match state.entries.keys().next().copied() {
            Some(key) => key,
            None => return Ok(None),
        };

        // Entry presence was just checked under the same lock
        let entry = match state.entries.remove(&first_key) {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let path = self.payload_path(&entry.file_name);
        let payload = match tokio::fs::read(&path).await {
            Ok(data) => Bytes::from(data),
            Err(e) => {
                // The record is unusable; drop it and report a miss
                tracing::warn!(
                    key = entry.key,
                    path = %path.display(),
                    error = %e,
                    "Failed to read blob payload, dropping record"
                );
                self.persist_index(&state).await?;
                return Ok(None);
            }
        };

        let _ = tokio::fs::remove_file(&path).await;
        self.persist_index(&state).await?;

        Ok(Some(StoredBlob {
            key: entry.key,
            payload,
            photographer: entry.photographer,
            profile_url: entry.profile_url,
            inserted_at_ms: entry.inserted_at_ms,
        }))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let state = self.state.lock().await;
        Ok(state.entries.len() as u64)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        for entry in state.entries.values() {
            let _ = tokio::fs::remove_file(self.payload_path(&entry.file_name)).await;
        }
        state.entries.clear();
        // next_key stays monotonic so insertion keys are never reused
        self.persist_index(&state).await?;

        Ok(())
    }

    async fn last_refresh_ms(&self) -> Result<Option<i64>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.last_refresh_ms)
    }

    async fn set_last_refresh_ms(&self, ts_ms: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.last_refresh_ms = Some(ts_ms);
        self.persist_index(&state).await
    }
}
