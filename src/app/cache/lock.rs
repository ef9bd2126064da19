//! Cross-process exclusive locks on cache entry files
//!
//! A lock is an open read/write handle on the entry file holding an OS
//! advisory exclusive lock (`flock` on Unix, `LockFileEx` on Windows). The
//! attempt never blocks in the OS; contention is handled by polling at
//! [`POLL_INTERVAL`](crate::constants::cache::POLL_INTERVAL) until the wait
//! timeout is used up. Nothing here relies on in-process synchronization, so
//! threads and unrelated processes contend on equal terms.
//!
//! Closing the handle releases the OS lock, so dropping a lock on any path
//! (including a panic or a cancelled future) frees the entry.

use std::fs::{File as StdFile, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use fs4::fs_std::FileExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::constants::cache;
use crate::errors::{LockError, LockResult};

/// Outcome of a single non-blocking lock attempt
enum Attempt {
    Acquired(StdFile),
    Contended,
    Failed(io::Error),
}

/// Open (creating if needed) and try to lock the entry without blocking
fn try_lock_entry(path: &Path) -> Attempt {
    let file = match OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
    {
        Ok(file) => file,
        Err(e) => return Attempt::Failed(e),
    };

    match FileExt::try_lock_exclusive(&file) {
        Ok(()) => {}
        Err(e) if e.raw_os_error() == fs4::lock_contended_error().raw_os_error() => {
            return Attempt::Contended
        }
        Err(e) => return Attempt::Failed(e),
    }

    // A fresh handle starts at 0; rewinding keeps the contract explicit
    let mut file = file;
    match file.seek(SeekFrom::Start(0)) {
        Ok(_) => Attempt::Acquired(file),
        Err(e) => Attempt::Failed(e),
    }
}

/// Tracks accumulated polling time against the wait timeout
struct PollBudget {
    timeout: Duration,
    waited: Duration,
    last_error: Option<io::Error>,
}

impl PollBudget {
    fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            waited: Duration::ZERO,
            last_error: None,
        }
    }

    /// Record a failed attempt; returns false once the budget is spent
    fn record(&mut self, path: &Path, attempt: Attempt) -> bool {
        if let Attempt::Failed(e) = attempt {
            debug!("Attempt on file lock {} failed: {}", path.display(), e);
            self.last_error = Some(e);
        }
        self.waited += cache::POLL_INTERVAL;
        self.waited < self.timeout
    }

    fn into_error(self, path: &Path) -> LockError {
        warn!(
            "Timeout acquiring file lock {} after {:?}",
            path.display(),
            self.waited
        );
        LockError::Timeout {
            path: path.to_path_buf(),
            waited: self.waited,
            last_error: self.last_error,
        }
    }
}

/// Exclusive async handle on a cache entry
#[derive(Debug)]
pub struct EntryLock {
    file: Option<File>,
    path: PathBuf,
}

impl EntryLock {
    /// Acquire the entry lock, suspending between polls
    ///
    /// Attempts run on the blocking thread pool and waits use the runtime
    /// timer, so no worker thread is held while another holder owns the
    /// entry. At least one attempt is made even with a zero timeout.
    ///
    /// # Errors
    ///
    /// Returns `LockError::Timeout` if the entry stays locked (or cannot be
    /// opened) for the whole timeout
    pub async fn acquire(path: &Path, timeout: Duration) -> LockResult<Self> {
        debug!("Acquiring file lock {}", path.display());
        let mut budget = PollBudget::new(timeout);

        loop {
            let entry_path = path.to_path_buf();
            let outcome = tokio::task::spawn_blocking(move || try_lock_entry(&entry_path))
                .await
                .unwrap_or_else(|e| Attempt::Failed(io::Error::other(e)));

            match outcome {
                Attempt::Acquired(file) => {
                    debug!("File lock {} acquired", path.display());
                    return Ok(Self {
                        file: Some(File::from_std(file)),
                        path: path.to_path_buf(),
                    });
                }
                other => {
                    if !budget.record(path, other) {
                        return Err(budget.into_error(path));
                    }
                    tokio::time::sleep(cache::POLL_INTERVAL).await;
                }
            }
        }
    }

    /// Path of the locked entry
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mutable access to the locked stream
    pub fn file_mut(&mut self) -> &mut File {
        self.file
            .as_mut()
            .expect("entry lock accessed after release")
    }

    /// Flush pending writes and release the OS lock
    pub async fn release(mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush().await {
                warn!("Failed to flush cache entry {}: {}", self.path.display(), e);
            }
            let file = file.into_std().await;
            unlock(&file, &self.path);
            debug!("File lock {} released", self.path.display());
        }
    }
}

impl Drop for EntryLock {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            // Closing the descriptor releases the OS lock
            debug!("File lock {} released", self.path.display());
        }
    }
}

/// Exclusive blocking handle on a cache entry
#[derive(Debug)]
pub struct BlockingEntryLock {
    file: Option<StdFile>,
    path: PathBuf,
}

impl BlockingEntryLock {
    /// Acquire the entry lock, sleeping the calling thread between polls
    ///
    /// # Errors
    ///
    /// Returns `LockError::Timeout` if the entry stays locked for the whole
    /// timeout
    pub fn acquire(path: &Path, timeout: Duration) -> LockResult<Self> {
        debug!("Acquiring file lock {}", path.display());
        let mut budget = PollBudget::new(timeout);

        loop {
            match try_lock_entry(path) {
                Attempt::Acquired(file) => {
                    debug!("File lock {} acquired", path.display());
                    return Ok(Self {
                        file: Some(file),
                        path: path.to_path_buf(),
                    });
                }
                other => {
                    if !budget.record(path, other) {
                        return Err(budget.into_error(path));
                    }
                    std::thread::sleep(cache::POLL_INTERVAL);
                }
            }
        }
    }

    /// Path of the locked entry
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mutable access to the locked stream
    pub fn file_mut(&mut self) -> &mut StdFile {
        self.file
            .as_mut()
            .expect("entry lock accessed after release")
    }

    /// Release the OS lock
    pub fn release(mut self) {
        if let Some(file) = self.file.take() {
            unlock(&file, &self.path);
            debug!("File lock {} released", self.path.display());
        }
    }
}

impl Drop for BlockingEntryLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            unlock(&file, &self.path);
            debug!("File lock {} released", self.path.display());
        }
    }
}

fn unlock(file: &StdFile, path: &Path) {
    if let Err(e) = FileExt::unlock(file) {
        // The descriptor is closed right after, which frees the lock anyway
        warn!("Failed to unlock cache entry {}: {}", path.display(), e);
    }
}
