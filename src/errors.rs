//! Error types for remote-file-cache
//!
//! Lock acquisition and download failures are sibling kinds under the
//! [`CacheError`] umbrella; a failed download is never reported as a locking
//! failure. [`AppError`] wraps everything for the command-line layer.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures obtaining exclusive access to a cache entry
#[derive(Error, Debug)]
pub enum LockError {
    /// Cache root could not be created after all attempts
    #[error("Unable to create cache directory {path}: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another holder kept the entry locked for the whole wait
    #[error("Timeout acquiring file lock {path} after {waited:?}")]
    Timeout {
        path: PathBuf,
        waited: Duration,
        #[source]
        last_error: Option<std::io::Error>,
    },
}

/// Failures refreshing the content of a locked entry
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// Every transport attempt failed
    #[error("Downloading {url} failed after {attempts} attempts: {message}")]
    AttemptsExhausted {
        url: String,
        attempts: u32,
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// Downloaded content could not be written into the entry file
    #[error("Failed to write downloaded content to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Umbrella error for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Exclusive access could not be obtained
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Content could not be refreshed
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Request options were rejected before any I/O
    #[error("Invalid cache options: {reason}")]
    InvalidOptions { reason: String },

    /// Encoded cache key could not be decoded
    #[error("Invalid cache key: {key}")]
    InvalidKey { key: String },

    /// Entry metadata could not be read
    #[error("Failed to inspect cache entry {path}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Entry stream could not be rewound
    #[error("Failed to rewind cache entry {path}")]
    Seek {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Entry content could not be read
    #[error("Failed to read cache entry {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Private runtime for a blocking download could not be started
    #[error("Failed to start runtime for blocking download")]
    Runtime(#[source] std::io::Error),
}

impl CacheError {
    /// Create an invalid-options error with a reason
    pub fn invalid_options(reason: impl Into<String>) -> Self {
        Self::InvalidOptions {
            reason: reason.into(),
        }
    }

    /// Check if retrying the whole call later may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            CacheError::Lock(LockError::Timeout { .. })
            | CacheError::Download(DownloadError::AttemptsExhausted { .. }) => true,

            CacheError::Lock(LockError::DirectoryUnavailable { .. })
            | CacheError::Download(DownloadError::ClientBuild(_))
            | CacheError::Download(DownloadError::Write { .. })
            | CacheError::InvalidOptions { .. }
            | CacheError::InvalidKey { .. } => false,

            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            CacheError::Lock(_) => "lock",
            CacheError::Download(_) => "download",
            CacheError::InvalidOptions { .. } | CacheError::InvalidKey { .. } => "options",
            CacheError::Inspect { .. } | CacheError::Seek { .. } | CacheError::Read { .. } => "io",
            CacheError::Runtime(_) => "runtime",
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read or written
    #[error("Failed to access configuration file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Platform has no user configuration directory
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Cache(e) => e.category(),
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

impl From<LockError> for AppError {
    fn from(error: LockError) -> Self {
        AppError::Cache(error.into())
    }
}

impl From<DownloadError> for AppError {
    fn from(error: DownloadError) -> Self {
        AppError::Cache(error.into())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Lock result type alias
pub type LockResult<T> = std::result::Result<T, LockError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_and_download_are_siblings() {
        let lock: CacheError = LockError::Timeout {
            path: PathBuf::from("/tmp/x.cache"),
            waited: Duration::from_secs(1),
            last_error: None,
        }
        .into();
        let write: CacheError = DownloadError::Write {
            path: PathBuf::from("/tmp/x.cache"),
            source: std::io::Error::other("disk full"),
        }
        .into();

        assert!(matches!(lock, CacheError::Lock(_)));
        assert!(matches!(write, CacheError::Download(_)));
        assert_eq!(lock.category(), "lock");
        assert_eq!(write.category(), "download");
    }

    #[test]
    fn test_recoverability() {
        let timeout = CacheError::Lock(LockError::Timeout {
            path: PathBuf::from("a.cache"),
            waited: Duration::ZERO,
            last_error: None,
        });
        assert!(timeout.is_recoverable());
        assert!(!CacheError::invalid_options("bad scheme").is_recoverable());
        assert!(!CacheError::Runtime(std::io::Error::other("no threads")).is_recoverable());
    }

    #[test]
    fn test_timeout_message_names_path() {
        let error = LockError::Timeout {
            path: PathBuf::from("/cache/abc.cache"),
            waited: Duration::from_millis(900),
            last_error: None,
        };
        assert!(error.to_string().contains("/cache/abc.cache"));
    }

    #[test]
    fn test_app_error_wraps_cache_errors() {
        let app: AppError = CacheError::invalid_options("missing host").into();
        assert_eq!(app.category(), "options");
        assert!(app.to_string().contains("missing host"));
        assert_eq!(AppError::generic("boom").category(), "generic");
    }

    #[test]
    fn test_read_failure_names_reading() {
        let error = CacheError::Read {
            path: PathBuf::from("/cache/abc.cache"),
            source: std::io::Error::other("device gone"),
        };
        assert!(error.to_string().starts_with("Failed to read cache entry"));
        assert!(error.to_string().contains("/cache/abc.cache"));
        assert_eq!(error.category(), "io");
        assert!(!error.is_recoverable());
    }
}
