//! Shared cache of fetched image bytes.
//!
//! Reply images are fetched once and uploaded with every message that uses
//! them. The cache is keyed by source URL and bounded: once `max_entries` is
//! reached the oldest entry is evicted. Two concurrent misses for the same
//! URL may both fetch; the second insert overwrites the first with the same
//! bytes.

use crate::error::DeliveryError;
use bytes::Bytes;
use rootcause::Report;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Default number of images kept.
pub const DEFAULT_MAX_ENTRIES: usize = 64;

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, Bytes>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
}

/// URL-keyed image byte cache.
#[derive(Debug)]
pub struct ImageCache {
    max_entries: usize,
    state: RwLock<CacheState>,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl ImageCache {
    /// Creates a cache holding at most `max_entries` images (at least one).
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Returns the cached bytes for `url`, if present.
    pub async fn get(&self, url: &str) -> Option<Bytes> {
        self.state.read().await.entries.get(url).cloned()
    }

    /// Stores bytes for `url`, evicting the oldest entries when full.
    pub async fn insert(&self, url: &str, bytes: Bytes) {
        let mut state = self.state.write().await;
        if state.entries.insert(url.to_string(), bytes).is_none() {
            state.order.push_back(url.to_string());
        }
        while state.entries.len() > self.max_entries {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
        }
    }

    /// Number of cached images.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Returns true if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns the bytes for `url`, fetching and caching them on a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be downloaded.
    #[instrument(skip(self, http))]
    pub async fn get_or_fetch(
        &self,
        http: &reqwest::Client,
        url: &str,
    ) -> Result<Bytes, Report<DeliveryError>> {
        if let Some(bytes) = self.get(url).await {
            return Ok(bytes);
        }

        let fetch_failed = |reason: String| DeliveryError::ImageFetchFailed {
            url: url.to_string(),
            reason,
        };

        let response = http
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_failed(format!("status {}", status.as_u16())).into());
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;

        debug!(size = bytes.len(), "fetched image");
        self.insert(url, bytes.clone()).await;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn evicts_oldest_when_full() {
        let cache = ImageCache::new(2);
        cache.insert("a", Bytes::from_static(b"a")).await;
        cache.insert("b", Bytes::from_static(b"b")).await;
        cache.insert("c", Bytes::from_static(b"c")).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("a").await.is_none());
        assert_eq!(cache.get("c").await, Some(Bytes::from_static(b"c")));
    }

    #[tokio::test]
    async fn reinserting_keeps_a_single_entry() {
        let cache = ImageCache::new(2);
        cache.insert("a", Bytes::from_static(b"1")).await;
        cache.insert("a", Bytes::from_static(b"1")).await;
        cache.insert("b", Bytes::from_static(b"2")).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("a").await.is_some());
    }

    #[tokio::test]
    async fn fetches_once_then_serves_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/fish.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png-bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let cache = ImageCache::default();
        let http = reqwest::Client::new();
        let url = format!("{}/img/fish.png", server.uri());

        let first = cache.get_or_fetch(&http, &url).await.unwrap();
        let second = cache.get_or_fetch(&http, &url).await.unwrap();

        assert_eq!(first, Bytes::from_static(b"png-bytes"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_image_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cache = ImageCache::default();
        let url = format!("{}/img/none.png", server.uri());
        let err = cache
            .get_or_fetch(&reqwest::Client::new(), &url)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("404"));
        assert!(cache.is_empty().await);
    }
}
