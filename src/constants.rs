//! Application constants for remote-file-cache
//!
//! This module centralizes all constants used throughout the crate,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Cache layout and locking constants
pub mod cache {
    use super::Duration;

    /// Extension appended to every cache entry file
    pub const ENTRY_EXTENSION: &str = "cache";

    /// Application folder under the platform data directory
    pub const APP_DIR: &str = "remote-file-cache";

    /// Subfolder holding the entry files
    pub const ENTRIES_DIR: &str = "entries";

    /// Interval between lock attempts and directory creation attempts
    pub const POLL_INTERVAL: Duration = Duration::from_millis(300);

    /// Attempts made to create the cache root before giving up
    pub const DIRECTORY_ATTEMPTS: u32 = 3;

    /// Default maximum age of an entry before it is refreshed
    pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

    /// Default total time spent polling for an entry lock
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// TCP keep-alive interval
    pub const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
}

/// Retry configuration for downloads
pub mod limits {
    use super::Duration;

    /// Total download attempts (first try included)
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Linear backoff step; attempt `n` waits `n * RETRY_STEP`
    pub const RETRY_STEP: Duration = Duration::from_secs(1);
}

/// Configuration file locations
pub mod config {
    /// File name inside the user config directory
    pub const FILE_NAME: &str = "config.toml";

    /// Project-local config file name
    pub const LOCAL_FILE_NAME: &str = "remote-file-cache.toml";
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "warn";

    /// Tracing target directive used by the CLI filter
    pub const CRATE_TARGET: &str = "remote_file_cache";
}

pub use cache::{DEFAULT_LOCK_TIMEOUT, DEFAULT_UPDATE_INTERVAL, POLL_INTERVAL};
pub use http::USER_AGENT;
pub use limits::{MAX_ATTEMPTS, RETRY_STEP};
