//! Best-effort prefetch cache for cuisine images
//!
//! Fetches the image manifest and warms an in-memory cache keyed by
//! filename. A file that fails its primary fetch falls back to a raw byte
//! download encoded as an inline data URL; if both fail the filename is
//! simply absent and callers use `direct_url` instead. Nothing here ever
//! propagates an error.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::future;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One cached image
#[derive(Debug, Clone)]
pub struct ImageCacheEntry {
    pub url: String,
    /// Inline representation from the fallback path, when the primary
    /// fetch did not yield a displayable image
    pub data_url: Option<String>,
}

pub struct ImageCache {
    base_url: String,
    client: reqwest::Client,
    entries: HashMap<String, ImageCacheEntry>,
}

impl ImageCache {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            entries: HashMap::new(),
        }
    }

    /// Fetch the manifest and warm the cache concurrently.
    ///
    /// Fire-and-forget: failures are logged and swallowed.
    pub async fn preload(&mut self) {
        let manifest_url = format!(
            "{}/images/manifest.json?v={}",
            self.base_url,
            cache_buster()
        );

        let filenames: Vec<String> = match self.fetch_manifest(&manifest_url).await {
            Ok(filenames) => filenames,
            Err(e) => {
                log::warn!("image manifest fetch failed: {}", e);
                return;
            }
        };
        log::debug!("preloading {} cuisine images", filenames.len());

        let fetches = filenames.iter().map(|filename| {
            let client = self.client.clone();
            let url = format!("{}/images/{}?v={}", self.base_url, filename, cache_buster());
            async move {
                let entry = fetch_image(&client, &url).await;
                (filename.clone(), entry)
            }
        });

        for (filename, entry) in future::join_all(fetches).await {
            match entry {
                Some(entry) => {
                    self.entries.insert(filename, entry);
                }
                None => log::debug!("image '{}' not cached", filename),
            }
        }
    }

    async fn fetch_manifest(&self, url: &str) -> Result<Vec<String>, reqwest::Error> {
        self.client
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<String>>()
            .await
    }

    /// Cached entry for a filename, if the prefetch got it
    pub fn lookup(&self, filename: &str) -> Option<&ImageCacheEntry> {
        self.entries.get(filename)
    }

    /// Cache-busted direct URL; the fallback when `lookup` misses
    pub fn direct_url(&self, filename: &str) -> String {
        format!("{}/images/{}?v={}", self.base_url, filename, cache_buster())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetch one image; primary path keeps the URL, fallback inlines the bytes.
/// Returns None when both paths fail.
async fn fetch_image(client: &reqwest::Client, url: &str) -> Option<ImageCacheEntry> {
    match client.get(url).timeout(FETCH_TIMEOUT).send().await {
        Ok(response) if response.status().is_success() => {
            let mime = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();

            if mime.starts_with("image/") {
                return Some(ImageCacheEntry {
                    url: url.to_string(),
                    data_url: None,
                });
            }

            // Served without an image content type: inline the raw bytes
            let bytes = response.bytes().await.ok()?;
            Some(ImageCacheEntry {
                url: url.to_string(),
                data_url: Some(to_data_url("image/png", &bytes)),
            })
        }
        Ok(response) => {
            log::debug!("image fetch {} returned {}", url, response.status());
            // Retry once for the raw bytes before giving up
            let bytes = client
                .get(url)
                .timeout(FETCH_TIMEOUT)
                .send()
                .await
                .ok()?
                .error_for_status()
                .ok()?
                .bytes()
                .await
                .ok()?;
            Some(ImageCacheEntry {
                url: url.to_string(),
                data_url: Some(to_data_url("image/png", &bytes)),
            })
        }
        Err(e) => {
            log::debug!("image fetch {} failed: {}", url, e);
            None
        }
    }
}

fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

fn cache_buster() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_miss_is_none() {
        let cache = ImageCache::new("http://localhost:8000");
        assert!(cache.lookup("dosa.png").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_direct_url_shape() {
        let cache = ImageCache::new("http://localhost:8000/");
        let url = cache.direct_url("dosa.png");
        assert!(url.starts_with("http://localhost:8000/images/dosa.png?v="));
    }

    #[test]
    fn test_data_url_encoding() {
        let data_url = to_data_url("image/png", b"abc");
        assert_eq!(data_url, "data:image/png;base64,YWJj");
    }
}
