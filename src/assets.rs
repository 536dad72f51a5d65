//! Bundled fallback assets
//!
//! A fixed catalog of locally bundled background images, addressed by
//! stable identifiers. One of these is painted synchronously on every tab
//! open before any network or store I/O runs, so the screen is never
//! blank. Resolving an identifier to pixels is the display layer's job.

use rand::Rng;

/// Default bundled asset identifiers
pub const DEFAULT_FALLBACK_ASSETS: &[&str] = &[
    "preloaded/img1.jpg",
    "preloaded/img2.jpg",
    "preloaded/img3.jpg",
];

/// Catalog of bundled fallback assets with uniform random selection
#[derive(Debug, Clone)]
pub struct FallbackCatalog {
    assets: Vec<String>,
}

impl FallbackCatalog {
    /// Catalog over the default bundled identifiers
    pub fn new() -> Self {
        Self {
            assets: DEFAULT_FALLBACK_ASSETS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Catalog over custom identifiers. An empty list falls back to the
    /// default set so a tab open can always paint something.
    pub fn with_assets(assets: Vec<String>) -> Self {
        if assets.is_empty() {
            tracing::warn!("Empty fallback asset list, falling back to defaults");
            return Self::new();
        }
        Self { assets }
    }

    /// Uniform random draw from the catalog
    pub fn pick(&self) -> &str {
        let idx = rand::thread_rng().gen_range(0..self.assets.len());
        &self.assets[idx]
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// All identifiers in the catalog
    pub fn identifiers(&self) -> &[String] {
        &self.assets
    }
}

impl Default for FallbackCatalog {
    fn default() -> Self {
        Self::new()
    }
}
