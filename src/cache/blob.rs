//! Blob cache tier
//!
//! Same conceptual contract as the metadata tier, but asynchronous and
//! keyed: binary payloads live in a `BlobStore` under auto-incrementing
//! insertion keys, so a true count query and ordered pops are available.
//! The tier's last-refresh timestamp is persisted in the store itself,
//! keeping this `CacheState` fully independent of the metadata tier's.

use std::sync::Arc;
use std::time::Duration;

use super::entry::PhotoBlob;
use super::now_ms;
use crate::store::BlobStore;

/// Asynchronous persisted queue of downloaded image payloads
pub struct BlobCache {
    store: Arc<dyn BlobStore>,
    ttl: Duration,
}

impl BlobCache {
    pub fn new(store: Arc<dyn BlobStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Append `entries` as one batch and stamp the refresh timestamp.
    ///
    /// Entries failing validation (empty payload or missing attribution)
    /// are skipped silently; a store failure on one entry never aborts
    /// the rest. Returns the number of records actually stored.
    pub async fn put_all(&self, entries: Vec<PhotoBlob>) -> usize {
        self.put_all_at(entries, now_ms()).await
    }

    pub async fn put_all_at(&self, entries: Vec<PhotoBlob>, now: i64) -> usize {
        let mut stored = 0;

        for entry in entries {
            if !is_valid(&entry) {
                continue;
            }
            match self
                .store
                .append(
                    entry.payload,
                    &entry.photographer,
                    &entry.profile_url,
                    entry.inserted_at_ms,
                )
                .await
            {
                Ok(_) => stored += 1,
                Err(e) => {
                    tracing::warn!(
                        photographer = %entry.photographer,
                        error = %e,
                        "Failed to store blob entry, skipping"
                    );
                }
            }
        }

        if let Err(e) = self.store.set_last_refresh_ms(now).await {
            tracing::warn!(error = %e, "Failed to stamp blob tier refresh timestamp");
        }

        stored
    }

    /// Remove and return the oldest stored payload.
    ///
    /// Misses on an absent timestamp and on an empty store; a stale store
    /// is purged wholesale before reporting the miss. Read and delete are
    /// one logical operation, so each record reaches exactly one caller.
    pub async fn pop_oldest(&self) -> Option<PhotoBlob> {
        self.pop_oldest_at(now_ms()).await
    }

    pub async fn pop_oldest_at(&self, now: i64) -> Option<PhotoBlob> {
        let last_refresh = match self.store.last_refresh_ms().await {
            Ok(ts) => ts,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read blob tier refresh timestamp");
                return None;
            }
        };

        let last_refresh = last_refresh?;

        if now.saturating_sub(last_refresh) > self.ttl.as_millis() as i64 {
            if let Err(e) = self.store.clear().await {
                tracing::warn!(error = %e, "Failed to purge stale blob tier");
            }
            return None;
        }

        match self.store.take_first().await {
            Ok(Some(blob)) => Some(PhotoBlob {
                payload: blob.payload,
                photographer: blob.photographer,
                profile_url: blob.profile_url,
                inserted_at_ms: blob.inserted_at_ms,
            }),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to pop blob entry");
                None
            }
        }
    }

    /// Number of currently stored records (0 on store failure)
    pub async fn count(&self) -> u64 {
        match self.store.count().await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to count blob entries");
                0
            }
        }
    }

    /// Stamp the refresh timestamp without touching stored records
    pub async fn touch(&self) -> Result<(), crate::store::StoreError> {
        self.touch_at(now_ms()).await
    }

    pub async fn touch_at(&self, now: i64) -> Result<(), crate::store::StoreError> {
        self.store.set_last_refresh_ms(now).await
    }

    /// True when a refresh should run: no timestamp, TTL elapsed, or the
    /// store has fallen below half of `target`.
    pub async fn needs_refresh(&self, target: usize) -> bool {
        self.needs_refresh_at(target, now_ms()).await
    }

    pub async fn needs_refresh_at(&self, target: usize, now: i64) -> bool {
        let last_refresh = match self.store.last_refresh_ms().await {
            Ok(Some(ts)) => ts,
            Ok(None) => return true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read blob tier refresh timestamp");
                return true;
            }
        };

        if now.saturating_sub(last_refresh) > self.ttl.as_millis() as i64 {
            return true;
        }

        (self.count().await as usize) * 2 < target
    }
}

/// Validation applied to each incoming batch entry
fn is_valid(entry: &PhotoBlob) -> bool {
    !entry.payload.is_empty() && !entry.photographer.is_empty() && !entry.profile_url.is_empty()
}
