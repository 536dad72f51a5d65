// Error types module

use std::fmt;

use crate::store::StoreError;

/// Centralized error type for the tab engine
///
/// Categorizes errors into 4 main types. Per the boundary policy, fetch
/// and store failures are converted to empty/None results by the component
/// that produced them; this type surfaces only where a caller genuinely
/// needs to distinguish outcomes (config loading, the quote pipeline,
/// binary startup).
#[derive(Debug)]
pub enum TabError {
    /// Configuration errors (invalid YAML, missing fields, bad paths)
    Config(String),

    /// Remote fetch errors (transport failure, non-2xx, malformed body)
    Fetch(String),

    /// Persisted store errors (I/O, serialization)
    Store(StoreError),

    /// Internal errors (unexpected states)
    Internal(String),
}

impl fmt::Display for TabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabError::Config(msg) => write!(f, "Configuration error: {}", msg),
            TabError::Fetch(msg) => write!(f, "Fetch error: {}", msg),
            TabError::Store(err) => write!(f, "Store error: {}", err),
            TabError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for TabError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TabError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for TabError {
    fn from(err: StoreError) -> Self {
        TabError::Store(err)
    }
}
