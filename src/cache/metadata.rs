//! Metadata cache tier
//!
//! A synchronous, TTL-bound persisted FIFO queue of `PhotoMetadata`
//! records over a string-keyed KV store. Two keys are persisted: the
//! JSON-serialized queue and the last-refresh timestamp (epoch ms).
//!
//! Staleness is evaluated at read time: an expired state is erased
//! eagerly and reported as a miss. A queue that fails to parse is
//! treated as empty, never as an error.

use std::sync::Arc;
use std::time::Duration;

use super::entry::PhotoMetadata;
use super::now_ms;
use crate::constants::{METADATA_QUEUE_KEY, METADATA_REFRESH_KEY};
use crate::store::{KvStore, StoreError};

/// Outcome of reading the persisted cache state.
///
/// One read-and-validate path serves every consumer; a corrupt queue is
/// folded into `Queue(vec![])` rather than surfacing as an error.
#[derive(Debug, PartialEq, Eq)]
pub enum CacheRead {
    /// Fresh state with its (possibly empty) queue
    Queue(Vec<PhotoMetadata>),
    /// No state persisted
    Absent,
    /// State exists but the TTL has elapsed
    Stale,
}

/// Synchronous persisted queue of photo metadata
pub struct MetadataCache {
    store: Arc<dyn KvStore>,
    ttl: Duration,
}

impl MetadataCache {
    pub fn new(store: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Read and validate the persisted state at `now`
    pub fn read_state(&self, now: i64) -> CacheRead {
        let last_refresh = self
            .store
            .get(METADATA_REFRESH_KEY)
            .and_then(|raw| raw.parse::<i64>().ok());

        let last_refresh = match last_refresh {
            Some(ts) => ts,
            None => return CacheRead::Absent,
        };

        if now.saturating_sub(last_refresh) > self.ttl.as_millis() as i64 {
            return CacheRead::Stale;
        }

        let queue = match self.store.get(METADATA_QUEUE_KEY) {
            Some(raw) => serde_json::from_str::<Vec<PhotoMetadata>>(&raw).unwrap_or_default(),
            None => Vec::new(),
        };

        CacheRead::Queue(queue)
    }

    /// Remove and return the oldest queued entry.
    ///
    /// Misses on absent state, on an empty queue, and on stale state; the
    /// stale case eagerly erases both persisted keys before reporting the
    /// miss.
    pub fn peek_and_pop(&self) -> Option<PhotoMetadata> {
        self.peek_and_pop_at(now_ms())
    }

    pub fn peek_and_pop_at(&self, now: i64) -> Option<PhotoMetadata> {
        match self.read_state(now) {
            CacheRead::Absent => None,
            CacheRead::Stale => {
                self.erase();
                None
            }
            CacheRead::Queue(mut queue) => {
                if queue.is_empty() {
                    return None;
                }
                let entry = queue.remove(0);
                if let Err(e) = self.write_queue(&queue) {
                    // The entry is still worth displaying; the shortened
                    // queue just failed to persist
                    tracing::warn!(error = %e, "Failed to persist shortened metadata queue");
                }
                Some(entry)
            }
        }
    }

    /// Overwrite the queue with `entries` and stamp the refresh timestamp.
    /// Applies unconditionally, even for an empty slice (an empty stamp
    /// still delays the next refresh attempt).
    pub fn replace_all(&self, entries: &[PhotoMetadata]) -> Result<(), StoreError> {
        self.replace_all_at(entries, now_ms())
    }

    pub fn replace_all_at(&self, entries: &[PhotoMetadata], now: i64) -> Result<(), StoreError> {
        self.write_queue(entries)?;
        self.store.set(METADATA_REFRESH_KEY, &now.to_string())
    }

    /// Stamp the refresh timestamp without touching the queue
    pub fn touch(&self) -> Result<(), StoreError> {
        self.touch_at(now_ms())
    }

    pub fn touch_at(&self, now: i64) -> Result<(), StoreError> {
        self.store.set(METADATA_REFRESH_KEY, &now.to_string())
    }

    /// True when a refresh should run: no timestamp, TTL elapsed, or the
    /// queue has fallen below half of `target`.
    pub fn needs_refresh(&self, target: usize) -> bool {
        self.needs_refresh_at(target, now_ms())
    }

    pub fn needs_refresh_at(&self, target: usize, now: i64) -> bool {
        match self.read_state(now) {
            CacheRead::Absent | CacheRead::Stale => true,
            CacheRead::Queue(queue) => queue.len() * 2 < target,
        }
    }

    /// Number of currently queued entries (0 when absent, stale, or corrupt)
    pub fn queue_len(&self) -> usize {
        match self.read_state(now_ms()) {
            CacheRead::Queue(queue) => queue.len(),
            _ => 0,
        }
    }

    fn write_queue(&self, entries: &[PhotoMetadata]) -> Result<(), StoreError> {
        let json = serde_json::to_string(entries)?;
        self.store.set(METADATA_QUEUE_KEY, &json)
    }

    /// Erase both persisted keys (queue and timestamp)
    fn erase(&self) {
        if let Err(e) = self.store.remove(METADATA_QUEUE_KEY) {
            tracing::warn!(error = %e, "Failed to erase stale metadata queue");
        }
        if let Err(e) = self.store.remove(METADATA_REFRESH_KEY) {
            tracing::warn!(error = %e, "Failed to erase stale refresh timestamp");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FileKvStore;
    use tempfile::TempDir;

    const TTL: Duration = Duration::from_secs(4 * 60 * 60);

    fn cache_in(dir: &TempDir) -> (MetadataCache, Arc<FileKvStore>) {
        let store = Arc::new(FileKvStore::open(dir.path().join("kv.json")).unwrap());
        (MetadataCache::new(store.clone(), TTL), store)
    }

    fn photo(n: u32) -> PhotoMetadata {
        PhotoMetadata::new(
            format!("https://images.example.com/{n}.jpg"),
            format!("Photographer {n}"),
            format!("https://example.com/@p{n}"),
        )
    }

    #[test]
    fn test_pop_on_absent_state_returns_none() {
        let dir = TempDir::new().unwrap();
        let (cache, _) = cache_in(&dir);
        assert_eq!(cache.peek_and_pop_at(1_000), None);
    }

    #[test]
    fn test_replace_all_then_pops_drain_in_original_order() {
        let dir = TempDir::new().unwrap();
        let (cache, _) = cache_in(&dir);

        let batch = vec![photo(1), photo(2), photo(3)];
        cache.replace_all_at(&batch, 1_000).unwrap();
        assert_eq!(cache.queue_len(), 3);

        assert_eq!(cache.peek_and_pop_at(2_000), Some(photo(1)));
        assert_eq!(cache.peek_and_pop_at(2_000), Some(photo(2)));
        assert_eq!(cache.peek_and_pop_at(2_000), Some(photo(3)));
        assert_eq!(cache.peek_and_pop_at(2_000), None);
    }

    #[test]
    fn test_stale_state_is_erased_eagerly_on_pop() {
        let dir = TempDir::new().unwrap();
        let (cache, store) = cache_in(&dir);

        cache.replace_all_at(&[photo(1)], 1_000).unwrap();

        let past_ttl = 1_000 + TTL.as_millis() as i64 + 1;
        assert_eq!(cache.peek_and_pop_at(past_ttl), None);

        // Both keys are gone, not just expired
        assert_eq!(store.get(METADATA_QUEUE_KEY), None);
        assert_eq!(store.get(METADATA_REFRESH_KEY), None);
        assert_eq!(cache.read_state(past_ttl), CacheRead::Absent);
    }

    #[test]
    fn test_state_at_exact_ttl_boundary_is_still_fresh() {
        let dir = TempDir::new().unwrap();
        let (cache, _) = cache_in(&dir);

        cache.replace_all_at(&[photo(1)], 1_000).unwrap();
        let at_ttl = 1_000 + TTL.as_millis() as i64;
        assert_eq!(cache.peek_and_pop_at(at_ttl), Some(photo(1)));
    }

    #[test]
    fn test_corrupt_queue_is_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        let (cache, store) = cache_in(&dir);

        store.set(METADATA_QUEUE_KEY, "not json").unwrap();
        store.set(METADATA_REFRESH_KEY, "1000").unwrap();

        assert_eq!(cache.peek_and_pop_at(2_000), None);
        assert_eq!(cache.read_state(2_000), CacheRead::Queue(vec![]));
    }

    #[test]
    fn test_unparseable_timestamp_reads_as_absent() {
        let dir = TempDir::new().unwrap();
        let (cache, store) = cache_in(&dir);

        store.set(METADATA_REFRESH_KEY, "yesterday").unwrap();
        assert_eq!(cache.read_state(2_000), CacheRead::Absent);
    }

    #[test]
    fn test_needs_refresh_true_without_timestamp() {
        let dir = TempDir::new().unwrap();
        let (cache, _) = cache_in(&dir);
        assert!(cache.needs_refresh_at(5, 1_000));
    }

    #[test]
    fn test_needs_refresh_true_past_ttl_even_with_full_queue() {
        let dir = TempDir::new().unwrap();
        let (cache, _) = cache_in(&dir);

        let batch = vec![photo(1), photo(2), photo(3), photo(4), photo(5)];
        cache.replace_all_at(&batch, 1_000).unwrap();

        let past_ttl = 1_000 + TTL.as_millis() as i64 + 1;
        assert!(cache.needs_refresh_at(5, past_ttl));
    }

    #[test]
    fn test_needs_refresh_true_below_low_water_mark_even_when_fresh() {
        let dir = TempDir::new().unwrap();
        let (cache, _) = cache_in(&dir);

        // 2 entries against a target of 5: 2*2 < 5
        cache.replace_all_at(&[photo(1), photo(2)], 1_000).unwrap();
        assert!(cache.needs_refresh_at(5, 2_000));
    }

    #[test]
    fn test_needs_refresh_false_when_fresh_and_at_low_water_mark() {
        let dir = TempDir::new().unwrap();
        let (cache, _) = cache_in(&dir);

        // 3 entries against a target of 5: 3*2 >= 5
        cache
            .replace_all_at(&[photo(1), photo(2), photo(3)], 1_000)
            .unwrap();
        assert!(!cache.needs_refresh_at(5, 2_000));
    }

    #[test]
    fn test_replace_all_with_empty_slice_still_stamps() {
        let dir = TempDir::new().unwrap();
        let (cache, store) = cache_in(&dir);

        cache.replace_all_at(&[], 1_000).unwrap();
        assert_eq!(store.get(METADATA_REFRESH_KEY), Some("1000".to_string()));

        // Fresh-but-empty is a miss, not absent
        assert_eq!(cache.read_state(2_000), CacheRead::Queue(vec![]));
        assert_eq!(cache.peek_and_pop_at(2_000), None);
    }

    #[test]
    fn test_touch_delays_staleness_without_touching_queue() {
        let dir = TempDir::new().unwrap();
        let (cache, _) = cache_in(&dir);

        cache.replace_all_at(&[photo(1)], 1_000).unwrap();

        // Just before the original state would expire, a touch renews it
        let near_ttl = 1_000 + TTL.as_millis() as i64 - 1;
        cache.touch_at(near_ttl).unwrap();

        let past_original_ttl = 1_000 + TTL.as_millis() as i64 + 1;
        assert_eq!(cache.peek_and_pop_at(past_original_ttl), Some(photo(1)));
    }

    #[test]
    fn test_pop_persists_the_shortened_queue() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.json");
        let store = Arc::new(FileKvStore::open(&path).unwrap());
        let cache = MetadataCache::new(store, TTL);

        cache.replace_all_at(&[photo(1), photo(2)], 1_000).unwrap();
        assert_eq!(cache.peek_and_pop_at(2_000), Some(photo(1)));

        // A different handle over the same file sees the shortened queue
        let store2 = Arc::new(FileKvStore::open(&path).unwrap());
        let cache2 = MetadataCache::new(store2, TTL);
        assert_eq!(cache2.queue_len(), 1);
        assert_eq!(cache2.peek_and_pop_at(2_000), Some(photo(2)));
    }
}
