//! Remote File Cache Library
//!
//! A Rust library for keeping a local copy of a remotely hosted file. Each
//! resource is cached in a single entry file that also serves as a
//! cross-process lock, so any number of threads, tasks and processes can
//! share one cache root without downloading the same resource twice.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, CacheError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        // Test that our constants are accessible
        assert_eq!(POLL_INTERVAL.as_millis(), 300);
        assert_eq!(DEFAULT_UPDATE_INTERVAL.as_secs(), 86_400);
        assert!(http::USER_AGENT.starts_with("remote-file-cache/"));
    }

    #[test]
    fn test_error_types() {
        // Test that our error types work correctly
        let cache_error = CacheError::Runtime(std::io::Error::other("no threads"));
        let app_error = AppError::Cache(cache_error);

        assert_eq!(app_error.category(), "runtime");
    }
}
