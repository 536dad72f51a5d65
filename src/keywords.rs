//! Topic keyword selection
//!
//! Each refresh batch is fetched under one keyword drawn uniformly from a
//! fixed catalog, keeping the prefetched backgrounds varied across tabs.

use rand::Rng;

/// Default catalog of scenic keywords
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "grand canyon sunset",
    "machu picchu sunrise",
    "salar de uyuni mirror",
    "uttarakhand himalayas",
    "empire state building nighttime",
    "great wall of china misty",
    "patagonia mountain range",
    "norwegian fjords twilight",
    "iceland waterfall",
    "sahara desert dunes",
    "death valley highway",
    "pacific coast highway overlook",
    "underwater sea cave opening",
    "infinity pool overlooking city",
    "serengeti sunrise",
    "nyc skyline from helicopter",
    "tokyo skyline at dusk",
    "dubai desert cityscape",
    "rio de janeiro from sugarloaf",
    "winding mountain road overlooking valley",
    "cliff edge overlooking ocean",
    "person standing at cliff edge",
    "sailboat at sunset on ocean",
    "misty forest at dawn",
    "lone runner on desert road",
    "nighttime city lights aerial view",
    "waterfall with rainbow mist",
    "rocky mountain sunrise",
    "foggy bridge with dramatic lighting",
];

/// Stateless uniform selection from a non-empty keyword catalog
#[derive(Debug, Clone)]
pub struct KeywordPicker {
    catalog: Vec<String>,
}

impl KeywordPicker {
    /// Picker over the default catalog
    pub fn new() -> Self {
        Self {
            catalog: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Picker over a custom catalog. An empty catalog falls back to the
    /// default one so `pick` always has something to draw from.
    pub fn with_catalog(catalog: Vec<String>) -> Self {
        if catalog.is_empty() {
            tracing::warn!("Empty keyword catalog, falling back to defaults");
            return Self::new();
        }
        Self { catalog }
    }

    /// Uniform random draw from the catalog
    pub fn pick(&self) -> &str {
        let idx = rand::thread_rng().gen_range(0..self.catalog.len());
        &self.catalog[idx]
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}

impl Default for KeywordPicker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_non_empty() {
        let picker = KeywordPicker::new();
        assert!(!picker.is_empty());
        assert_eq!(picker.len(), DEFAULT_KEYWORDS.len());
    }

    #[test]
    fn test_pick_always_returns_a_catalog_member() {
        let picker = KeywordPicker::new();
        for _ in 0..100 {
            let keyword = picker.pick();
            assert!(DEFAULT_KEYWORDS.contains(&keyword));
        }
    }

    #[test]
    fn test_custom_catalog_is_used() {
        let picker = KeywordPicker::with_catalog(vec!["aurora borealis".to_string()]);
        assert_eq!(picker.pick(), "aurora borealis");
    }

    #[test]
    fn test_empty_catalog_falls_back_to_defaults() {
        let picker = KeywordPicker::with_catalog(Vec::new());
        assert_eq!(picker.len(), DEFAULT_KEYWORDS.len());
    }
}
