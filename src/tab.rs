//! Tab orchestration
//!
//! One tab open runs a fixed sequence: paint a bundled fallback image
//! synchronously (the screen is never blank), then concurrently swap in
//! a cached image, trigger a background cache refresh, and load a quote.
//! The three asynchronous steps are joined as structured tasks with no
//! mutual ordering; none of them can fail the tab.
//!
//! Rendering is out of scope. The `Surface` trait is the seam the
//! display layer implements; `MemorySurface` records state changes for
//! the binary and for tests.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::assets::FallbackCatalog;
use crate::cache::{BlobCache, MetadataCache};
use crate::constants::{FALLBACK_QUOTE_TEXT, REFERRAL_SUFFIX};
use crate::quotes::{pick_random, QuoteSource};
use crate::refresh::CacheRefresher;

/// What the display layer should paint as the background
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    /// Bundled asset addressed by its stable identifier
    Asset(String),
    /// Remote image URL from the metadata tier
    Url(String),
    /// Raw image payload from the blob tier
    Bytes(Bytes),
}

/// Photographer credit shown with a swapped-in image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub photographer: String,
    /// Profile link with the referral suffix appended
    pub profile_url: String,
}

/// Display seam between the engine and whatever renders the tab
pub trait Surface: Send + Sync {
    /// Replace the background
    fn paint_background(&self, background: Background);

    /// Set or clear the photographer credit
    fn set_attribution(&self, attribution: Option<Attribution>);

    /// Set the quote text and author line
    fn set_quote(&self, text: &str, author_label: &str);

    /// True when a quote is already shown (guards the canned fallback)
    fn has_quote(&self) -> bool;
}

#[derive(Default)]
struct SurfaceState {
    backgrounds: Vec<Background>,
    attribution: Option<Attribution>,
    quote: Option<(String, String)>,
}

/// Recording `Surface` implementation
#[derive(Default)]
pub struct MemorySurface {
    state: Mutex<SurfaceState>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The background currently painted, if any
    pub fn current_background(&self) -> Option<Background> {
        self.state.lock().backgrounds.last().cloned()
    }

    /// Every background painted so far, oldest first
    pub fn background_history(&self) -> Vec<Background> {
        self.state.lock().backgrounds.clone()
    }

    pub fn attribution(&self) -> Option<Attribution> {
        self.state.lock().attribution.clone()
    }

    /// Currently shown (text, author label), if any
    pub fn quote(&self) -> Option<(String, String)> {
        self.state.lock().quote.clone()
    }
}

impl Surface for MemorySurface {
    fn paint_background(&self, background: Background) {
        self.state.lock().backgrounds.push(background);
    }

    fn set_attribution(&self, attribution: Option<Attribution>) {
        self.state.lock().attribution = attribution;
    }

    fn set_quote(&self, text: &str, author_label: &str) {
        self.state.lock().quote = Some((text.to_string(), author_label.to_string()));
    }

    fn has_quote(&self) -> bool {
        self.state.lock().quote.is_some()
    }
}

/// Append the referral suffix to a profile link for display
fn with_referral(profile_url: &str) -> String {
    format!("{profile_url}{REFERRAL_SUFFIX}")
}

/// Orchestrates one tab open
pub struct TabInitializer {
    surface: Arc<dyn Surface>,
    assets: FallbackCatalog,
    metadata: Arc<MetadataCache>,
    blobs: Option<Arc<BlobCache>>,
    refresher: Arc<CacheRefresher>,
    quotes: Arc<QuoteSource>,
    batch_size: usize,
}

impl TabInitializer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        surface: Arc<dyn Surface>,
        assets: FallbackCatalog,
        metadata: Arc<MetadataCache>,
        blobs: Option<Arc<BlobCache>>,
        refresher: Arc<CacheRefresher>,
        quotes: Arc<QuoteSource>,
        batch_size: usize,
    ) -> Self {
        Self {
            surface,
            assets,
            metadata,
            blobs,
            refresher,
            quotes,
            batch_size,
        }
    }

    /// Run one tab open.
    ///
    /// The fallback paint completes before the first suspension point;
    /// the cached-image swap, the cache refresh, and the quote load then
    /// run concurrently. The refresh never swaps this tab's image, it
    /// only replenishes the cache for future tabs.
    pub async fn open_tab(&self) {
        let asset = self.assets.pick().to_string();
        self.surface.paint_background(Background::Asset(asset));
        self.surface.set_attribution(None);

        tokio::join!(
            self.swap_in_cached(),
            self.refresher.refresh_if_needed(self.batch_size),
            self.show_quote(),
        );
    }

    /// Swap in a cached image: blob tier first when configured, then the
    /// metadata tier. On a full miss the fallback stays painted.
    async fn swap_in_cached(&self) {
        if let Some(blobs) = &self.blobs {
            if let Some(blob) = blobs.pop_oldest().await {
                self.surface
                    .paint_background(Background::Bytes(blob.payload));
                self.surface.set_attribution(Some(Attribution {
                    photographer: blob.photographer,
                    profile_url: with_referral(&blob.profile_url),
                }));
                return;
            }
        }

        if let Some(photo) = self.metadata.peek_and_pop() {
            self.surface.paint_background(Background::Url(photo.url));
            self.surface.set_attribution(Some(Attribution {
                photographer: photo.photographer,
                profile_url: with_referral(&photo.profile_url),
            }));
        }
    }

    async fn show_quote(&self) {
        match self.quotes.load().await {
            Ok(quotes) => match pick_random(&quotes) {
                Some(quote) => {
                    self.surface.set_quote(&quote.text, &quote.author_label());
                }
                None => self.fallback_quote(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load quote corpus");
                self.fallback_quote();
            }
        }
    }

    /// Canned quote, shown only when nothing is rendered yet
    fn fallback_quote(&self) {
        if !self.surface.has_quote() {
            self.surface.set_quote(FALLBACK_QUOTE_TEXT, "");
        }
    }
}
