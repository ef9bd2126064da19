//! Network fetcher for cache entries
//!
//! The fetcher downloads one resource with bounded retries. Only transport
//! failures (connect, send, timeout, body read) are retried; whatever status
//! code the server answers with is treated as content.
//!
//! - `config`: HTTP client configuration and retry policy

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error, warn};
use url::Url;

use crate::errors::{DownloadError, DownloadResult};

pub mod config;

pub use config::ClientConfig;

/// Downloads resource bodies with linear backoff between attempts
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    config: ClientConfig,
}

impl FileFetcher {
    /// Create a fetcher with the given configuration
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Get the fetcher configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Download the full body of `url`
    ///
    /// A new HTTP client is built per call so no connection pool outlives the
    /// runtime that drives it. `timeout` bounds each attempt separately.
    ///
    /// The whole body is held in memory before the cache entry is touched, so
    /// peak memory grows with the size of the remote resource. Nothing here
    /// caps it; callers caching very large resources should budget for it.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::AttemptsExhausted` carrying the last transport
    /// error once every attempt has failed
    pub async fn fetch(&self, url: &Url, timeout: Option<Duration>) -> DownloadResult<Vec<u8>> {
        let client = self.config.build_http_client()?;
        let max_attempts = self.config.max_attempts.max(1);

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!("Downloading data from {}, attempt: {}", url, attempt);

            match Self::fetch_attempt(&client, url, timeout).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt >= max_attempts => {
                    let message = e.to_string();
                    error!(
                        "Downloading file from {} failed with error: {}",
                        url, message
                    );
                    return Err(DownloadError::AttemptsExhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        message,
                        source: e,
                    });
                }
                Err(e) => {
                    let delay = self.config.backoff_for(attempt);
                    warn!(
                        "Download failed (attempt {}/{}): {}. Retrying in {}ms",
                        attempt,
                        max_attempts,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Single GET with the body read to completion
    async fn fetch_attempt(
        client: &Client,
        url: &Url,
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>, reqwest::Error> {
        let mut request = client.get(url.clone());
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        debug!("Received HTTP {} from {}", response.status(), url);

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
