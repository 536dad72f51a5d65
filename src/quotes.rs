//! Quote corpus
//!
//! Loads the `{text, author}` quote list from a local JSON file or an
//! HTTP URL and picks one uniformly at random per tab. The quote flow is
//! fully independent of the background/image flow.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::ANONYMOUS_AUTHOR;
use crate::error::TabError;

/// One quote record. `author` may be absent in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Quote {
    /// Author line as displayed: `— Name`, anonymous label when absent
    pub fn author_label(&self) -> String {
        match self.author.as_deref() {
            Some(author) if !author.is_empty() => format!("— {}", author),
            _ => format!("— {}", ANONYMOUS_AUTHOR),
        }
    }
}

/// Parsed source location for the quote corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteLocation {
    /// Local JSON file
    File(PathBuf),
    /// HTTP(S) URL
    Http(String),
}

impl QuoteLocation {
    /// Parse a source string: `http://`/`https://` prefixes are remote,
    /// anything else is a local file path.
    pub fn parse(source: &str) -> Self {
        if source.starts_with("https://") || source.starts_with("http://") {
            QuoteLocation::Http(source.to_string())
        } else {
            QuoteLocation::File(PathBuf::from(source))
        }
    }
}

/// Loader for the quote corpus
pub struct QuoteSource {
    location: QuoteLocation,
    http_client: reqwest::Client,
}

impl QuoteSource {
    /// Create a source for `location` (file path or URL).
    ///
    /// # Errors
    ///
    /// Returns `TabError::Config` if the HTTP client cannot be created.
    pub fn new(source: &str, timeout: Duration) -> Result<Self, TabError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TabError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            location: QuoteLocation::parse(source),
            http_client,
        })
    }

    /// Load the full corpus. Consumed once per tab.
    ///
    /// # Errors
    ///
    /// Returns `TabError::Fetch` on any read, transport, or parse failure.
    pub async fn load(&self) -> Result<Vec<Quote>, TabError> {
        match &self.location {
            QuoteLocation::File(path) => {
                let json = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| TabError::Fetch(format!("Failed to read quote file: {e}")))?;
                serde_json::from_str(&json)
                    .map_err(|e| TabError::Fetch(format!("Failed to parse quote file: {e}")))
            }
            QuoteLocation::Http(url) => {
                let response = self
                    .http_client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| TabError::Fetch(format!("Quote fetch failed: {e}")))?;

                if !response.status().is_success() {
                    return Err(TabError::Fetch(format!(
                        "Quote fetch failed with status: {}",
                        response.status()
                    )));
                }

                response
                    .json::<Vec<Quote>>()
                    .await
                    .map_err(|e| TabError::Fetch(format!("Failed to parse quote body: {e}")))
            }
        }
    }
}

/// Uniform random pick from a loaded corpus. None on an empty corpus.
pub fn pick_random(quotes: &[Quote]) -> Option<&Quote> {
    if quotes.is_empty() {
        return None;
    }
    let idx = rand::thread_rng().gen_range(0..quotes.len());
    Some(&quotes[idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_http_and_https_sources_are_remote() {
        assert_eq!(
            QuoteLocation::parse("https://example.com/quotes.json"),
            QuoteLocation::Http("https://example.com/quotes.json".to_string())
        );
        assert_eq!(
            QuoteLocation::parse("http://example.com/quotes.json"),
            QuoteLocation::Http("http://example.com/quotes.json".to_string())
        );
    }

    #[test]
    fn test_parse_plain_path_is_a_file() {
        assert_eq!(
            QuoteLocation::parse("data/quotes.json"),
            QuoteLocation::File(PathBuf::from("data/quotes.json"))
        );
    }

    #[test]
    fn test_author_label_uses_author_when_present() {
        let quote = Quote {
            text: "Hi".to_string(),
            author: Some("X".to_string()),
        };
        assert_eq!(quote.author_label(), "— X");
    }

    #[test]
    fn test_author_label_falls_back_to_anonymous() {
        let quote = Quote {
            text: "Hi".to_string(),
            author: None,
        };
        assert_eq!(quote.author_label(), "— Anon");

        let quote = Quote {
            text: "Hi".to_string(),
            author: Some(String::new()),
        };
        assert_eq!(quote.author_label(), "— Anon");
    }

    #[test]
    fn test_pick_random_on_empty_corpus_returns_none() {
        assert!(pick_random(&[]).is_none());
    }

    #[test]
    fn test_pick_random_returns_a_corpus_member() {
        let quotes = vec![
            Quote {
                text: "One".to_string(),
                author: None,
            },
            Quote {
                text: "Two".to_string(),
                author: Some("B".to_string()),
            },
        ];
        for _ in 0..20 {
            let picked = pick_random(&quotes).unwrap();
            assert!(quotes.contains(picked));
        }
    }

    #[tokio::test]
    async fn test_load_from_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quotes.json");
        std::fs::write(
            &path,
            r#"[{"text": "Hi", "author": "X"}, {"text": "Yo"}]"#,
        )
        .unwrap();

        let source =
            QuoteSource::new(path.to_str().unwrap(), Duration::from_secs(5)).unwrap();
        let quotes = source.load().await.unwrap();

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].text, "Hi");
        assert_eq!(quotes[0].author.as_deref(), Some("X"));
        assert_eq!(quotes[1].author, None);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_a_fetch_error() {
        let source = QuoteSource::new("/nonexistent/quotes.json", Duration::from_secs(5)).unwrap();
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, TabError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_load_malformed_file_is_a_fetch_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quotes.json");
        std::fs::write(&path, "{not a list").unwrap();

        let source =
            QuoteSource::new(path.to_str().unwrap(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            source.load().await.unwrap_err(),
            TabError::Fetch(_)
        ));
    }

    #[tokio::test]
    async fn test_load_empty_list_is_ok() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quotes.json");
        std::fs::write(&path, "[]").unwrap();

        let source =
            QuoteSource::new(path.to_str().unwrap(), Duration::from_secs(5)).unwrap();
        assert_eq!(source.load().await.unwrap(), Vec::<Quote>::new());
    }
}
