//! Prelude module for the Remote File Cache Library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use remote_file_cache::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use remote_file_cache::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let cache = FileCache::new();
//!     let options = CacheOptions::parse("https://example.com/download")?
//!         .with_update_interval(Duration::from_secs(600));
//!
//!     let content = cache.get_bytes(&options).await?;
//!     println!("{} bytes", content.len());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, CacheError, CacheResult, DownloadError, LockError, Result};

// Essential app components that are used in most integrations
pub use crate::app::{
    // Cache
    CacheKey,
    CacheOptions,
    ClientConfig,
    EntryStatus,
    FileCache,
    Freshness,
};

// Commonly used constants
pub use crate::constants::{DEFAULT_LOCK_TIMEOUT, DEFAULT_UPDATE_INTERVAL};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::time::Duration;

// Common external crate re-exports for convenience
pub use futures::FutureExt;
pub use tokio;
