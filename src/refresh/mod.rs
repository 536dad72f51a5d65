//! Cache refresher
//!
//! Decides whether the active cache tier is stale or low and, if so,
//! fetches a new batch through the proxy client and repopulates the tier.
//! Execution is single-flight per tier: each tier's in-flight token is
//! owned by the refresher instance, and a call arriving while a refresh
//! is running is a no-op (not queued, not retried).
//!
//! Refresh failure is never fatal to the calling tab: an empty batch and
//! any fetch/store error both just stamp the tier's refresh timestamp to
//! enforce backoff, leaving existing entries untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cache::{now_ms, BlobCache, MetadataCache, PhotoBlob};
use crate::client::PhotoFetcher;
use crate::keywords::KeywordPicker;

/// Per-tier in-flight token.
///
/// A token is owned by one refresher instance, so two refreshers (or two
/// test instances) never share flight state.
#[derive(Debug, Clone, Default)]
struct RefreshToken {
    in_flight: Arc<AtomicBool>,
}

impl RefreshToken {
    /// Acquire the token if no refresh is running. The returned guard
    /// releases the token on drop, including on early returns.
    fn try_acquire(&self) -> Option<RefreshGuard> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Some(RefreshGuard {
                flag: self.in_flight.clone(),
            })
        } else {
            None
        }
    }
}

/// Guard held for the duration of one refresh
struct RefreshGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Replenishes the cache tiers for future tabs
pub struct CacheRefresher {
    fetcher: Arc<dyn PhotoFetcher>,
    keywords: KeywordPicker,
    metadata: Arc<MetadataCache>,
    blobs: Option<Arc<BlobCache>>,
    metadata_flight: RefreshToken,
    blob_flight: RefreshToken,
}

impl CacheRefresher {
    pub fn new(
        fetcher: Arc<dyn PhotoFetcher>,
        keywords: KeywordPicker,
        metadata: Arc<MetadataCache>,
        blobs: Option<Arc<BlobCache>>,
    ) -> Self {
        Self {
            fetcher,
            keywords,
            metadata,
            blobs,
            metadata_flight: RefreshToken::default(),
            blob_flight: RefreshToken::default(),
        }
    }

    /// Check the active tier and refill it if stale or low.
    ///
    /// The blob tier is active when configured, otherwise the metadata
    /// tier. Never touches what the current tab displays.
    pub async fn refresh_if_needed(&self, target: usize) {
        match &self.blobs {
            Some(blobs) => self.refresh_blob_tier(blobs.clone(), target).await,
            None => self.refresh_metadata_tier(target).await,
        }
    }

    async fn refresh_metadata_tier(&self, target: usize) {
        let _guard = match self.metadata_flight.try_acquire() {
            Some(guard) => guard,
            None => {
                tracing::debug!("Metadata refresh already in flight, skipping");
                return;
            }
        };

        if !self.metadata.needs_refresh(target) {
            return;
        }

        let keyword = self.keywords.pick().to_string();
        let batch = self.fetcher.fetch_batch(&keyword, target).await;

        if batch.is_empty() {
            tracing::info!(keyword = %keyword, "Empty batch, stamping refresh timestamp for backoff");
            if let Err(e) = self.metadata.touch() {
                tracing::warn!(error = %e, "Failed to stamp metadata refresh timestamp");
            }
            return;
        }

        match self.metadata.replace_all(&batch) {
            Ok(()) => {
                tracing::info!(
                    keyword = %keyword,
                    fetched = batch.len(),
                    "Metadata cache refreshed"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to persist metadata batch");
                // Still enforce backoff so the next tab doesn't re-fetch
                // immediately
                if let Err(e) = self.metadata.touch() {
                    tracing::warn!(error = %e, "Failed to stamp metadata refresh timestamp");
                }
            }
        }
    }

    async fn refresh_blob_tier(&self, blobs: Arc<BlobCache>, target: usize) {
        let _guard = match self.blob_flight.try_acquire() {
            Some(guard) => guard,
            None => {
                tracing::debug!("Blob refresh already in flight, skipping");
                return;
            }
        };

        if !blobs.needs_refresh(target).await {
            return;
        }

        let keyword = self.keywords.pick().to_string();
        let batch = self.fetcher.fetch_batch(&keyword, target).await;

        if batch.is_empty() {
            tracing::info!(keyword = %keyword, "Empty batch, stamping refresh timestamp for backoff");
            if let Err(e) = blobs.touch().await {
                tracing::warn!(error = %e, "Failed to stamp blob refresh timestamp");
            }
            return;
        }

        // Download each payload, dropping entries whose download fails
        let mut entries = Vec::with_capacity(batch.len());
        for photo in &batch {
            match self.fetcher.download(&photo.url).await {
                Some(payload) => entries.push(PhotoBlob {
                    payload,
                    photographer: photo.photographer.clone(),
                    profile_url: photo.profile_url.clone(),
                    inserted_at_ms: now_ms(),
                }),
                None => {
                    tracing::warn!(url = %photo.url, "Dropping entry whose payload failed to download");
                }
            }
        }

        if entries.is_empty() {
            tracing::info!(keyword = %keyword, "No payloads survived download, stamping for backoff");
            if let Err(e) = blobs.touch().await {
                tracing::warn!(error = %e, "Failed to stamp blob refresh timestamp");
            }
            return;
        }

        let stored = blobs.put_all(entries).await;
        tracing::info!(keyword = %keyword, stored, "Blob cache refreshed");
    }
}
