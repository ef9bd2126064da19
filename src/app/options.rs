//! Per-call cache request options
//!
//! [`CacheOptions`] describes one request against the cache: which resource,
//! where entries live, and how stale and how contended an entry may be.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::app::cache::path;
use crate::app::key::CacheKey;
use crate::constants::cache;
use crate::errors::{CacheError, CacheResult};

/// Options for a single cache request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Remote resource to cache
    pub url: Url,
    /// Root directory for entries (platform data directory if None)
    pub cache_root: Option<PathBuf>,
    /// Per-attempt download timeout (unbounded if None)
    pub download_timeout: Option<Duration>,
    /// Maximum age of an entry before it is refreshed
    pub update_interval: Duration,
    /// Total time spent polling for the entry lock
    pub lock_timeout: Duration,
}

impl CacheOptions {
    /// Create options for a URL with default staleness and lock settings
    pub fn new(url: Url) -> Self {
        Self {
            url,
            cache_root: None,
            download_timeout: None,
            update_interval: cache::DEFAULT_UPDATE_INTERVAL,
            lock_timeout: cache::DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Parse a URL string and create options for it
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidOptions` if the URL does not parse or is not
    /// an http(s) URL
    pub fn parse(url: &str) -> CacheResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| CacheError::invalid_options(format!("invalid URL {}: {}", url, e)))?;
        let options = Self::new(url);
        options.validate()?;
        Ok(options)
    }

    /// Set the cache root directory
    pub fn with_cache_root(mut self, cache_root: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(cache_root.into());
        self
    }

    /// Set the per-attempt download timeout
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = Some(timeout);
        self
    }

    /// Set the staleness interval
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Set the lock-wait timeout
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Check that the request can be served
    pub fn validate(&self) -> CacheResult<()> {
        match self.url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(CacheError::invalid_options(format!(
                    "unsupported URL scheme '{}' in {}",
                    other, self.url
                )))
            }
        }

        if self.download_timeout == Some(Duration::ZERO) {
            return Err(CacheError::invalid_options(
                "download timeout must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Cache key for this request
    pub fn key(&self) -> CacheKey {
        CacheKey::from_url(&self.url)
    }

    /// Cache root, resolving the platform default when none was given
    pub fn resolve_cache_root(&self) -> PathBuf {
        self.cache_root
            .clone()
            .unwrap_or_else(path::default_cache_root)
    }

    /// Full path of the entry file for this request
    pub fn entry_path(&self) -> PathBuf {
        path::entry_path(&self.resolve_cache_root(), &self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = CacheOptions::parse("http://x/download").unwrap();
        assert_eq!(options.cache_root, None);
        assert_eq!(options.download_timeout, None);
        assert_eq!(options.update_interval, Duration::from_secs(86_400));
        assert_eq!(options.lock_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_options_builder() {
        let options = CacheOptions::parse("https://example.com/file.csv")
            .unwrap()
            .with_cache_root("/tmp/cache")
            .with_download_timeout(Duration::from_secs(10))
            .with_update_interval(Duration::from_secs(2))
            .with_lock_timeout(Duration::from_secs(1));

        assert_eq!(options.cache_root, Some(PathBuf::from("/tmp/cache")));
        assert_eq!(options.download_timeout, Some(Duration::from_secs(10)));
        assert_eq!(options.update_interval, Duration::from_secs(2));
        assert_eq!(options.lock_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        assert!(CacheOptions::parse("ftp://example.com/file").is_err());
        assert!(CacheOptions::parse("file:///etc/hosts").is_err());
        assert!(CacheOptions::parse("not a url").is_err());
    }

    #[test]
    fn test_rejects_zero_download_timeout() {
        let options = CacheOptions::parse("http://x/download")
            .unwrap()
            .with_download_timeout(Duration::ZERO);
        assert!(matches!(
            options.validate(),
            Err(CacheError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn test_entry_path_under_explicit_root() {
        let options = CacheOptions::parse("http://x/download")
            .unwrap()
            .with_cache_root("/var/cache/rfc");
        assert_eq!(
            options.entry_path(),
            PathBuf::from("/var/cache/rfc/NsWJmezzurqPAaNVPFzcbbEehH5rtapFjA4tyeMmGAM=.cache")
        );
    }

    #[test]
    fn test_default_root_resolved_at_call_time() {
        let options = CacheOptions::parse("http://x/download").unwrap();
        assert_eq!(options.resolve_cache_root(), path::default_cache_root());
        assert!(options.entry_path().starts_with(path::default_cache_root()));
    }
}
