//! Persisted store implementations
//!
//! This module provides the two persistence seams the cache tiers sit on:
//! - `KvStore`: string-keyed, synchronous store for small metadata values
//! - `BlobStore`: keyed, asynchronous store for binary image payloads
//!
//! Both ship with file-backed implementations (`FileKvStore`,
//! `DiskBlobStore`) that persist JSON snapshots with atomic writes.

pub use self::blob::{BlobStore, DiskBlobStore, StoredBlob};
pub use self::error::StoreError;
pub use self::kv::{FileKvStore, KvStore};

pub mod blob;
mod error;
pub mod kv;
