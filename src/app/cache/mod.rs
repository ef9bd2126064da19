//! Disk cache for single remote resources
//!
//! Each cached resource lives in exactly one entry file under the cache root.
//! The entry file doubles as the cross-process lock: whoever holds the
//! exclusive lock on it may check freshness, rewrite it and read it.
//!
//! # Module Organization
//!
//! - [`path`] - Cache root resolution and directory provisioning
//! - [`lock`] - Cross-process entry locks with bounded waiting
//! - [`freshness`] - Absent / stale / fresh classification of entries
//! - [`manager`] - The [`FileCache`] controller tying it all together
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use remote_file_cache::app::cache::FileCache;
//! use remote_file_cache::app::CacheOptions;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = FileCache::new();
//! let options = CacheOptions::parse("https://example.com/stations.csv")?
//!     .with_update_interval(Duration::from_secs(3600));
//!
//! let status = cache.inspect(&options).await?;
//! println!("{} is {}", status.path.display(), status.freshness);
//!
//! let content = cache.get_bytes(&options).await?;
//! println!("{} bytes", content.len());
//! # Ok(())
//! # }
//! ```

pub mod freshness;
pub mod lock;
pub mod manager;
pub mod path;

// Re-export main public API
pub use freshness::{evaluate, EntryStatus, Freshness};
pub use lock::{BlockingEntryLock, EntryLock};
pub use manager::FileCache;
pub use path::{default_cache_root, ensure_directory, entry_path};
