//! Image proxy client
//!
//! Talks to the remote image-lookup proxy and normalizes its responses.
//! The proxy returns photo records shaped
//! `{urls: {full}, user: {name, links: {html}}}`; a batch request may
//! come back as either one object or a list.
//!
//! Every failure mode (transport error, non-2xx status, malformed or
//! missing fields) is converted to `None`/empty at this boundary and
//! logged. Callers never retry synchronously; the only retry mechanism
//! is the time-gated refresh check on the next tab open.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::cache::PhotoMetadata;
use crate::error::TabError;

/// Fetcher seam between the refresher and the remote proxy
#[async_trait]
pub trait PhotoFetcher: Send + Sync {
    /// Fetch one photo record for `keyword`.
    /// Returns None on any transport, status, or validation failure.
    async fn fetch_one(&self, keyword: &str) -> Option<PhotoMetadata>;

    /// Fetch up to `count` photo records for `keyword` in one request.
    /// Short batches are accepted as-is; failures yield an empty vec.
    async fn fetch_batch(&self, keyword: &str, count: usize) -> Vec<PhotoMetadata>;

    /// Download one image payload. Returns None on any failure.
    async fn download(&self, url: &str) -> Option<Bytes>;
}

/// HTTP client for the image-lookup proxy
#[derive(Clone)]
pub struct ProxyClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ProxyClient {
    /// Create a client for the proxy at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `TabError::Config` if the HTTP client cannot be created
    /// (e.g., TLS configuration issues).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TabError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TabError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Build the proxy request URL for `keyword`, with an optional batch count
    fn request_url(&self, keyword: &str, count: Option<usize>) -> String {
        let mut url = format!(
            "{}/?keyword={}",
            self.base_url,
            urlencoding::encode(keyword)
        );
        if let Some(count) = count {
            url.push_str(&format!("&count={}", count));
        }
        url
    }

    async fn get_json(&self, url: &str) -> Result<JsonValue, String> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("HTTP fetch failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!(
                "HTTP request failed with status: {}",
                response.status()
            ));
        }

        response
            .json::<JsonValue>()
            .await
            .map_err(|e| format!("Failed to parse response body: {e}"))
    }
}

#[async_trait]
impl PhotoFetcher for ProxyClient {
    async fn fetch_one(&self, keyword: &str) -> Option<PhotoMetadata> {
        let url = self.request_url(keyword, None);

        match self.get_json(&url).await {
            Ok(body) => {
                let photo = normalize_to_list(body).iter().find_map(photo_from_value);
                if photo.is_none() {
                    tracing::warn!(keyword = %keyword, "Proxy returned no usable photo");
                }
                photo
            }
            Err(e) => {
                tracing::warn!(keyword = %keyword, error = %e, "Single-photo fetch failed");
                None
            }
        }
    }

    async fn fetch_batch(&self, keyword: &str, count: usize) -> Vec<PhotoMetadata> {
        if count == 0 {
            return Vec::new();
        }

        let url = self.request_url(keyword, Some(count));

        match self.get_json(&url).await {
            Ok(body) => {
                let items = normalize_to_list(body);
                let total = items.len();
                let photos: Vec<PhotoMetadata> =
                    items.iter().filter_map(photo_from_value).take(count).collect();

                if photos.len() < total {
                    tracing::warn!(
                        keyword = %keyword,
                        dropped = total - photos.len(),
                        kept = photos.len(),
                        "Dropped malformed entries from batch response"
                    );
                }
                photos
            }
            Err(e) => {
                tracing::warn!(keyword = %keyword, error = %e, "Batch fetch failed");
                Vec::new()
            }
        }
    }

    async fn download(&self, url: &str) -> Option<Bytes> {
        let response = match self.http_client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Image download failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                url = %url,
                status = %response.status(),
                "Image download returned non-success status"
            );
            return None;
        }

        match response.bytes().await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to read image body");
                None
            }
        }
    }
}

/// Normalize a response body (single object or list) to a list of values
fn normalize_to_list(body: JsonValue) -> Vec<JsonValue> {
    match body {
        JsonValue::Array(items) => items,
        other => vec![other],
    }
}

/// Map one response value to a `PhotoMetadata`, enforcing the
/// field-validity check: `urls.full`, `user.name`, and `user.links.html`
/// must all be present, non-empty strings.
fn photo_from_value(value: &JsonValue) -> Option<PhotoMetadata> {
    let url = value.get("urls")?.get("full")?.as_str()?;
    let user = value.get("user")?;
    let photographer = user.get("name")?.as_str()?;
    let profile_url = user.get("links")?.get("html")?.as_str()?;

    if url.is_empty() || photographer.is_empty() || profile_url.is_empty() {
        return None;
    }

    Some(PhotoMetadata::new(
        url.to_string(),
        photographer.to_string(),
        profile_url.to_string(),
    ))
}
