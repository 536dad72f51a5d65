// Constants module - centralized default values for configuration
//
// This module defines all default values used throughout the codebase.
// Using constants instead of magic numbers improves maintainability
// and makes it easier to understand and modify defaults.

// =============================================================================
// Cache defaults
// =============================================================================

/// Default cache TTL in seconds (4 hours)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 4 * 60 * 60;

/// Default number of photos fetched per refresh batch
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// KV key holding the metadata tier's JSON-serialized queue
pub const METADATA_QUEUE_KEY: &str = "image_cache";

/// KV key holding the metadata tier's last-refresh timestamp (epoch ms)
pub const METADATA_REFRESH_KEY: &str = "image_cache_time";

// =============================================================================
// HTTP defaults
// =============================================================================

/// Default HTTP request timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Display defaults
// =============================================================================

/// Query suffix appended to displayed photographer profile links
pub const REFERRAL_SUFFIX: &str = "?utm_source=sparktab&utm_medium=referral";

/// Quote shown when the corpus cannot be loaded and nothing is on screen
pub const FALLBACK_QUOTE_TEXT: &str = "An inspiring day awaits.";

/// Author label used when a quote record carries no author
pub const ANONYMOUS_AUTHOR: &str = "Anon";
