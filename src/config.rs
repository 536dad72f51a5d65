// Configuration module

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{DEFAULT_BATCH_SIZE, DEFAULT_CACHE_TTL_SECS};
use crate::error::TabError;

/// Top-level configuration, loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the image-lookup proxy
    pub proxy_url: String,

    /// Quote corpus location (local file path or HTTP URL)
    pub quotes_source: String,

    /// Directory holding the persisted stores
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub cache: CacheSettings,

    /// Optional keyword catalog override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,

    /// Optional bundled fallback asset override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_assets: Option<Vec<String>>,
}

/// Cache tier and refresh settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Refresh interval in seconds; cached state older than this is stale
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Number of photos fetched per refresh batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Which tier holds prefetched backgrounds
    #[serde(default)]
    pub tier: CacheTier,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            batch_size: default_batch_size(),
            tier: CacheTier::default(),
        }
    }
}

/// Active cache tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheTier {
    /// Lightweight tier: persisted URL queue, image fetched at display time
    #[default]
    Metadata,
    /// Heavy tier: image payloads downloaded at refresh time
    Blob,
}

fn default_ttl_seconds() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Config {
    /// Load and validate a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TabError> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| TabError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&yaml)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, TabError> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| TabError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field constraints beyond what serde enforces
    pub fn validate(&self) -> Result<(), TabError> {
        if self.proxy_url.is_empty() {
            return Err(TabError::Config("proxy_url must not be empty".to_string()));
        }
        if !self.proxy_url.starts_with("http://") && !self.proxy_url.starts_with("https://") {
            return Err(TabError::Config(format!(
                "proxy_url must be an HTTP(S) URL, got: {}",
                self.proxy_url
            )));
        }
        if self.quotes_source.is_empty() {
            return Err(TabError::Config(
                "quotes_source must not be empty".to_string(),
            ));
        }
        if self.cache.batch_size == 0 {
            return Err(TabError::Config(
                "cache.batch_size must be at least 1".to_string(),
            ));
        }
        if self.cache.ttl_seconds == 0 {
            return Err(TabError::Config(
                "cache.ttl_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Cache TTL as a duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const MINIMAL_YAML: &str = r#"
proxy_url: "https://proxy.example.workers.dev"
quotes_source: "quotes.json"
"#;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = Config::from_yaml(MINIMAL_YAML).unwrap();
        assert_eq!(config.cache.ttl_seconds, DEFAULT_CACHE_TTL_SECS);
        assert_eq!(config.cache.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.cache.tier, CacheTier::Metadata);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.keywords, None);
    }

    #[test]
    fn test_full_config_parses() {
        let yaml = r#"
proxy_url: "https://proxy.example.workers.dev"
quotes_source: "https://cdn.example.com/quotes.json"
data_dir: "/var/lib/sparktab"
cache:
  ttl_seconds: 7200
  batch_size: 8
  tier: blob
keywords:
  - "aurora borealis"
fallback_assets:
  - "bundled/alps.jpg"
  - "bundled/dunes.jpg"
  - "bundled/reef.jpg"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.cache.ttl_seconds, 7200);
        assert_eq!(config.cache.batch_size, 8);
        assert_eq!(config.cache.tier, CacheTier::Blob);
        assert_eq!(config.ttl(), Duration::from_secs(7200));
        assert_eq!(config.keywords.unwrap().len(), 1);
        assert_eq!(config.fallback_assets.unwrap().len(), 3);
    }

    #[test]
    fn test_config_can_be_loaded_from_file_path() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), MINIMAL_YAML).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.proxy_url, "https://proxy.example.workers.dev");
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let err = Config::from_file("/nonexistent/config.yaml").unwrap_err();
        assert!(matches!(err, TabError::Config(_)));
    }

    #[test]
    fn test_invalid_yaml_is_a_config_error() {
        assert!(matches!(
            Config::from_yaml("proxy_url: [unclosed").unwrap_err(),
            TabError::Config(_)
        ));
    }

    #[test]
    fn test_empty_proxy_url_is_rejected() {
        let yaml = r#"
proxy_url: ""
quotes_source: "quotes.json"
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_non_http_proxy_url_is_rejected() {
        let yaml = r#"
proxy_url: "ftp://proxy.example.com"
quotes_source: "quotes.json"
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let yaml = r#"
proxy_url: "https://proxy.example.com"
quotes_source: "quotes.json"
cache:
  batch_size: 0
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_unknown_tier_is_rejected() {
        let yaml = r#"
proxy_url: "https://proxy.example.com"
quotes_source: "quotes.json"
cache:
  tier: redis
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }
}
