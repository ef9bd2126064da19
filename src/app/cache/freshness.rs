//! Freshness evaluation for locked cache entries
//!
//! An empty entry file means the resource was never downloaded. A non-empty
//! entry is stale once its modification time is older than the update
//! interval. A resource whose body really is empty therefore always looks
//! absent and is fetched on every call.

use std::fmt;
use std::fs::{File as StdFile, Metadata};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs::File;
use tracing::debug;

use crate::app::key::CacheKey;
use crate::errors::{CacheError, CacheResult};

/// Three-state freshness of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Freshness {
    /// Entry holds no content yet
    Absent,
    /// Entry is older than the update interval
    Stale {
        #[serde(with = "humantime_serde")]
        age: Duration,
    },
    /// Entry is within the update interval
    Fresh {
        #[serde(with = "humantime_serde")]
        age: Duration,
    },
}

impl Freshness {
    /// Whether the entry must be downloaded before serving
    pub fn needs_refresh(&self) -> bool {
        !matches!(self, Freshness::Fresh { .. })
    }

    /// Age of the entry content, if any
    pub fn age(&self) -> Option<Duration> {
        match self {
            Freshness::Absent => None,
            Freshness::Stale { age } | Freshness::Fresh { age } => Some(*age),
        }
    }
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Freshness::Absent => write!(f, "absent"),
            Freshness::Stale { age } => write!(f, "stale (age {}s)", age.as_secs()),
            Freshness::Fresh { age } => write!(f, "fresh (age {}s)", age.as_secs()),
        }
    }
}

/// Classify an entry from its length and modification time
///
/// A modification time in the future counts as age zero.
pub fn evaluate(
    len: u64,
    last_modified: DateTime<Utc>,
    now: DateTime<Utc>,
    update_interval: Duration,
) -> Freshness {
    if len == 0 {
        return Freshness::Absent;
    }

    let age = now
        .signed_duration_since(last_modified)
        .to_std()
        .unwrap_or(Duration::ZERO);

    if age > update_interval {
        Freshness::Stale { age }
    } else {
        Freshness::Fresh { age }
    }
}

/// Snapshot of a cache entry taken under its lock
#[derive(Debug, Clone, Serialize)]
pub struct EntryStatus {
    /// Cache key of the entry
    pub key: CacheKey,
    /// Entry file path
    pub path: PathBuf,
    /// Content length in bytes
    pub size: u64,
    /// Last modification time, absent for empty entries
    pub last_modified: Option<DateTime<Utc>>,
    /// Freshness against the requested update interval
    pub freshness: Freshness,
}

/// Inspect a locked entry file
///
/// # Errors
///
/// Returns `CacheError::Inspect` if the file metadata cannot be read
pub async fn inspect_entry(
    file: &File,
    key: CacheKey,
    path: &Path,
    update_interval: Duration,
) -> CacheResult<EntryStatus> {
    let metadata = file
        .metadata()
        .await
        .map_err(|source| inspect_error(path, source))?;
    status_from_metadata(&metadata, key, path, update_interval)
}

/// Blocking counterpart of [`inspect_entry`]
pub fn inspect_entry_blocking(
    file: &StdFile,
    key: CacheKey,
    path: &Path,
    update_interval: Duration,
) -> CacheResult<EntryStatus> {
    let metadata = file
        .metadata()
        .map_err(|source| inspect_error(path, source))?;
    status_from_metadata(&metadata, key, path, update_interval)
}

fn status_from_metadata(
    metadata: &Metadata,
    key: CacheKey,
    path: &Path,
    update_interval: Duration,
) -> CacheResult<EntryStatus> {
    let size = metadata.len();

    let last_modified = if size == 0 {
        None
    } else {
        let modified: DateTime<Utc> = metadata
            .modified()
            .map_err(|source| inspect_error(path, source))?
            .into();
        debug!(
            "Found existing file {}, size {}, last modified on {}",
            path.display(),
            size,
            modified.to_rfc3339()
        );
        Some(modified)
    };

    let freshness = match last_modified {
        Some(modified) => evaluate(size, modified, Utc::now(), update_interval),
        None => Freshness::Absent,
    };

    Ok(EntryStatus {
        key,
        path: path.to_path_buf(),
        size,
        last_modified,
        freshness,
    })
}

fn inspect_error(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Inspect {
        path: path.to_path_buf(),
        source,
    }
}
