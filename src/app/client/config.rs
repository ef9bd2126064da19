//! HTTP client configuration and building logic
//!
//! This module handles the configuration of the fetcher: how its HTTP client
//! is built and how many times a failed download is retried.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{http, limits};
use crate::errors::{ConfigError, ConfigResult, DownloadError, DownloadResult};

/// Configuration for the download client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// User agent sent with every request
    pub user_agent: String,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// TCP keep-alive settings
    pub tcp_keepalive: Option<Duration>,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Total download attempts, first try included
    pub max_attempts: u32,
    /// Linear backoff step; attempt `n` is followed by `n * retry_step`
    pub retry_step: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: http::USER_AGENT.to_string(),
            connect_timeout: http::CONNECT_TIMEOUT,
            tcp_keepalive: Some(http::TCP_KEEPALIVE),
            tcp_nodelay: true,
            max_attempts: limits::MAX_ATTEMPTS,
            retry_step: limits::RETRY_STEP,
        }
    }
}

impl ClientConfig {
    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, max_attempts: u32, retry_step: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.retry_step = retry_step;
        self
    }

    /// Delay after a failed attempt (1-based), saturating at `Duration::MAX`
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.retry_step
            .checked_mul(attempt)
            .unwrap_or(Duration::MAX)
    }

    /// Reject settings the fetcher cannot work with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_attempts".to_string(),
                value: self.max_attempts.to_string(),
                reason: "At least one download attempt is required".to_string(),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "user_agent".to_string(),
                value: self.user_agent.clone(),
                reason: "User agent must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Builds the HTTP client with the specified configuration
    ///
    /// There is no overall request timeout here; the per-download timeout is
    /// applied to each request by the fetcher.
    pub fn build_http_client(&self) -> DownloadResult<Client> {
        let mut client_builder = Client::builder()
            .user_agent(self.user_agent.as_str())
            .connect_timeout(self.connect_timeout)
            .tcp_nodelay(self.tcp_nodelay)
            .pool_idle_timeout(http::POOL_IDLE_TIMEOUT);

        if let Some(keepalive) = self.tcp_keepalive {
            client_builder = client_builder.tcp_keepalive(keepalive);
        }

        client_builder.build().map_err(DownloadError::ClientBuild)
    }
}
