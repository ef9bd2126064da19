//! Core application logic for the remote file cache
//!
//! This module contains the cache key derivation, per-request options, the
//! download client and the disk cache that coordinates them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use remote_file_cache::app::{CacheOptions, FileCache};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = FileCache::new();
//! let options = CacheOptions::parse("https://example.com/download")?;
//!
//! println!("Entry: {}", cache.entry_path(&options)?.display());
//! let content = cache.get_bytes(&options).await?;
//! println!("Fetched {} bytes", content.len());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod key;
pub mod options;

// Re-export main public API
pub use cache::{BlockingEntryLock, EntryLock, EntryStatus, FileCache, Freshness};
pub use client::{ClientConfig, FileFetcher};
pub use key::CacheKey;
pub use options::CacheOptions;
