//! Photo data model
//!
//! This module defines the records flowing through the cache tiers:
//! - `PhotoMetadata`: URL + attribution, produced by the proxy client and
//!   queued by the metadata tier
//! - `PhotoBlob`: downloaded image payload + attribution, queued by the
//!   blob tier

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Photo metadata record: where the image lives and who to credit.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    /// Full-size image URL
    pub url: String,
    /// Photographer display name
    pub photographer: String,
    /// Photographer profile link
    pub profile_url: String,
}

impl PhotoMetadata {
    pub fn new(url: String, photographer: String, profile_url: String) -> Self {
        Self {
            url,
            photographer,
            profile_url,
        }
    }
}

/// Downloaded image payload plus attribution.
///
/// Owned exclusively by the blob tier once stored; ownership transfers to
/// the caller on pop, at which point the store's copy is deleted.
#[derive(Debug, Clone)]
pub struct PhotoBlob {
    /// Raw image bytes
    pub payload: Bytes,
    /// Photographer display name
    pub photographer: String,
    /// Photographer profile link
    pub profile_url: String,
    /// Insertion timestamp (epoch ms)
    pub inserted_at_ms: i64,
}
