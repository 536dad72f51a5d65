//! Two-tier prefetch cache
//!
//! This module provides the two cache tiers the tab engine draws from:
//! - `MetadataCache`: synchronous, TTL-bound persisted queue of photo
//!   metadata (URL + attribution) over a string-keyed KV store
//! - `BlobCache`: asynchronous persisted queue of binary image payloads
//!   over a keyed blob store
//!
//! Both tiers are FIFO: entries are appended in bulk by a refresh and
//! removed one at a time by a consumer pop.

pub use self::blob::BlobCache;
pub use self::entry::{PhotoBlob, PhotoMetadata};
pub use self::metadata::{CacheRead, MetadataCache};

pub mod blob;
pub mod entry;
pub mod metadata;

/// Current wall-clock time as milliseconds since the epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
