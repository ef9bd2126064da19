//! Entry path resolution and cache directory provisioning
//!
//! Entries live flat under the cache root as `<key>.cache`. The root is
//! created on demand; creation is retried a few times because several
//! processes may race to create it at once.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::app::key::CacheKey;
use crate::constants::cache;
use crate::errors::{LockError, LockResult};

/// Get the default cache root for the current OS
///
/// Uses the platform data directory so entries are shared by every process of
/// the same user:
/// - macOS: ~/Library/Application Support/remote-file-cache/entries
/// - Linux: ~/.local/share/remote-file-cache/entries
/// - Windows: %APPDATA%/remote-file-cache/entries
///
/// Falls back to the system temp directory when no data directory exists.
pub fn default_cache_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(cache::APP_DIR)
        .join(cache::ENTRIES_DIR)
}

/// Path of the entry file for a key under a cache root
pub fn entry_path(cache_root: &Path, key: &CacheKey) -> PathBuf {
    cache_root.join(key.file_name())
}

/// Ensure a directory exists, retrying transient creation failures
///
/// A regular file at `path` does not count as the directory.
///
/// # Errors
///
/// Returns `LockError::DirectoryUnavailable` once all attempts have failed
pub async fn ensure_directory(path: &Path) -> LockResult<()> {
    let mut attempt = 0;
    while !fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
        attempt += 1;
        match fs::create_dir_all(path).await {
            Ok(()) => debug!("Created cache directory {}", path.display()),
            Err(e) if attempt >= cache::DIRECTORY_ATTEMPTS => {
                return Err(LockError::DirectoryUnavailable {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                warn!(
                    "Creating cache directory {} failed (attempt {}/{}): {}",
                    path.display(),
                    attempt,
                    cache::DIRECTORY_ATTEMPTS,
                    e
                );
                tokio::time::sleep(cache::POLL_INTERVAL).await;
            }
        }
    }
    Ok(())
}

/// Blocking counterpart of [`ensure_directory`]
pub fn ensure_directory_blocking(path: &Path) -> LockResult<()> {
    let mut attempt = 0;
    while !path.is_dir() {
        attempt += 1;
        match std::fs::create_dir_all(path) {
            Ok(()) => debug!("Created cache directory {}", path.display()),
            Err(e) if attempt >= cache::DIRECTORY_ATTEMPTS => {
                return Err(LockError::DirectoryUnavailable {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                warn!(
                    "Creating cache directory {} failed (attempt {}/{}): {}",
                    path.display(),
                    attempt,
                    cache::DIRECTORY_ATTEMPTS,
                    e
                );
                std::thread::sleep(cache::POLL_INTERVAL);
            }
        }
    }
    Ok(())
}
