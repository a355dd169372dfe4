//! Audio retrieval for exports.

use std::path::PathBuf;
use std::time::Duration;

use photoglow_common::error::{PhotoglowError, PhotoglowResult};

/// Source of a track's encoded audio.
#[async_trait::async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Download the full body at `url`.
    async fn fetch(&self, url: &str) -> PhotoglowResult<Vec<u8>>;
}

/// Fetches `http(s)://` URLs with reqwest and `file://` URLs from disk.
///
/// Only connection setup is bounded. Once connected, a download runs until
/// it completes or the transport fails.
#[derive(Debug, Clone)]
pub struct HttpAudioFetcher {
    client: reqwest::Client,
}

impl HttpAudioFetcher {
    pub fn new() -> PhotoglowResult<Self> {
        Self::with_connect_timeout(Duration::from_secs(30))
    }

    pub fn with_connect_timeout(connect_timeout: Duration) -> PhotoglowResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("photoglow/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| PhotoglowError::fetch(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn fetch_http(&self, url: &str) -> PhotoglowResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PhotoglowError::fetch(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PhotoglowError::fetch(format!("HTTP {status} from {url}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PhotoglowError::fetch(format!("Failed reading body of {url}: {e}")))?;
        Ok(body.to_vec())
    }

    async fn fetch_file(&self, path: PathBuf) -> PhotoglowResult<Vec<u8>> {
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PhotoglowError::fetch(format!("{} does not exist", path.display())))
            }
            Err(e) => Err(PhotoglowError::fetch(format!(
                "Failed reading {}: {e}",
                path.display()
            ))),
        }
    }
}

#[async_trait::async_trait]
impl AudioFetcher for HttpAudioFetcher {
    async fn fetch(&self, url: &str) -> PhotoglowResult<Vec<u8>> {
        tracing::debug!(url, "Fetching audio");
        let started = std::time::Instant::now();

        let bytes = if let Some(path) = url.strip_prefix("file://") {
            self.fetch_file(PathBuf::from(path)).await?
        } else if url.starts_with("http://") || url.starts_with("https://") {
            self.fetch_http(url).await?
        } else {
            return Err(PhotoglowError::fetch(format!("Unsupported audio URL: {url}")));
        };

        if bytes.is_empty() {
            return Err(PhotoglowError::fetch(format!("Empty audio body from {url}")));
        }

        tracing::info!(
            url,
            bytes = bytes.len(),
            fetch_ms = started.elapsed().as_millis(),
            "Audio fetched"
        );
        Ok(bytes)
    }
}
