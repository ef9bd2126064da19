//! Cache controller
//!
//! [`FileCache`] runs the full protocol for one request:
//!
//! 1. derive the key and provision the cache root;
//! 2. take the cross-process lock on the entry file;
//! 3. evaluate freshness under the lock;
//! 4. download and overwrite the entry when it is absent or stale;
//! 5. hand the rewound stream to the caller's callback;
//! 6. release the lock, whatever happened in steps 3 to 5.
//!
//! Callers racing on the same key serialize on the lock. Whoever arrives after
//! a refresh finds a fresh entry and skips the network.

use std::fs::File as StdFile;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::app::client::{ClientConfig, FileFetcher};
use crate::app::options::CacheOptions;
use crate::errors::{CacheError, CacheResult, DownloadError};

use super::freshness::{inspect_entry, inspect_entry_blocking, EntryStatus};
use super::lock::{BlockingEntryLock, EntryLock};
use super::path::{ensure_directory, ensure_directory_blocking};

/// Disk-backed cache for single remote resources
///
/// The cache itself is stateless; all coordination happens through the entry
/// files, so any number of `FileCache` values (in any number of processes)
/// can share one cache root.
#[derive(Debug, Clone, Default)]
pub struct FileCache {
    fetcher: FileFetcher,
}

impl FileCache {
    /// Create a cache with the default client configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache with a custom client configuration
    pub fn with_client_config(config: ClientConfig) -> Self {
        Self {
            fetcher: FileFetcher::new(config),
        }
    }

    /// Get the client configuration
    pub fn client_config(&self) -> &ClientConfig {
        self.fetcher.config()
    }

    /// Resolve the entry path for a request without touching the filesystem
    pub fn entry_path(&self, options: &CacheOptions) -> CacheResult<PathBuf> {
        options.validate()?;
        Ok(options.entry_path())
    }

    /// Run `action` with an up-to-date stream of the cached resource
    ///
    /// The stream is positioned at offset 0 and stays exclusively locked while
    /// `action` runs. The lock is released before this returns, whether
    /// `action` succeeded or not. Errors from the cache convert into `E`;
    /// errors from `action` are returned unchanged.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use futures::FutureExt;
    /// use remote_file_cache::app::{CacheOptions, FileCache};
    /// use tokio::io::AsyncReadExt;
    ///
    /// type BoxError = Box<dyn std::error::Error + Send + Sync>;
    ///
    /// # async fn example() -> Result<(), BoxError> {
    /// let cache = FileCache::new();
    /// let options = CacheOptions::parse("https://example.com/data.csv")?;
    ///
    /// let content = cache
    ///     .get_stream_async(&options, |file| {
    ///         async move {
    ///             let mut content = String::new();
    ///             file.read_to_string(&mut content).await?;
    ///             Ok::<_, BoxError>(content)
    ///         }
    ///         .boxed()
    ///     })
    ///     .await?;
    /// println!("{}", content);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_stream_async<T, E, F>(&self, options: &CacheOptions, action: F) -> Result<T, E>
    where
        F: for<'a> FnOnce(&'a mut File) -> BoxFuture<'a, Result<T, E>>,
        E: From<CacheError>,
    {
        let mut entry = self.prepare_entry(options).await?;
        let outcome = action(entry.file_mut()).await;
        entry.release().await;
        outcome
    }

    /// Blocking counterpart of [`FileCache::get_stream_async`]
    ///
    /// Provisioning, locking and the freshness check run on the calling
    /// thread. A download, when needed, runs on a private current-thread
    /// runtime driven by a scoped helper thread, so this works from plain
    /// threads and from `tokio::task::spawn_blocking` alike. Calling it
    /// directly on a runtime worker thread blocks that worker until done.
    pub fn get_stream<T, E, F>(&self, options: &CacheOptions, action: F) -> Result<T, E>
    where
        F: FnOnce(&mut StdFile) -> Result<T, E>,
        E: From<CacheError>,
    {
        options.validate()?;
        let path = options.entry_path();

        ensure_directory_blocking(&options.resolve_cache_root()).map_err(CacheError::from)?;
        let mut entry =
            BlockingEntryLock::acquire(&path, options.lock_timeout).map_err(CacheError::from)?;

        if let Err(e) = self.refresh_if_needed_blocking(&mut entry, options) {
            entry.release();
            return Err(e.into());
        }

        let outcome = action(entry.file_mut());
        entry.release();
        outcome
    }

    /// Read the whole cached resource into memory
    pub async fn get_bytes(&self, options: &CacheOptions) -> CacheResult<Vec<u8>> {
        let path = options.entry_path();
        self.get_stream_async(options, move |file| {
            async move {
                let mut content = Vec::new();
                file.read_to_end(&mut content)
                    .await
                    .map_err(|source| CacheError::Read { path, source })?;
                Ok(content)
            }
            .boxed()
        })
        .await
    }

    /// Blocking counterpart of [`FileCache::get_bytes`]
    pub fn get_bytes_blocking(&self, options: &CacheOptions) -> CacheResult<Vec<u8>> {
        let path = options.entry_path();
        self.get_stream(options, move |file| {
            let mut content = Vec::new();
            file.read_to_end(&mut content)
                .map_err(|source| CacheError::Read { path, source })?;
            Ok(content)
        })
    }

    /// Report the state of an entry without downloading anything
    ///
    /// The lock is held only while the metadata is read.
    pub async fn inspect(&self, options: &CacheOptions) -> CacheResult<EntryStatus> {
        options.validate()?;
        let cache_root = options.resolve_cache_root();
        let key = options.key();
        let path = options.entry_path();

        ensure_directory(&cache_root).await?;
        let mut entry = EntryLock::acquire(&path, options.lock_timeout).await?;
        let status = inspect_entry(entry.file_mut(), key, &path, options.update_interval).await;
        entry.release().await;
        status
    }

    /// Lock the entry and bring it up to date
    ///
    /// On any failure after the lock was taken, the lock is released before
    /// the error is returned.
    async fn prepare_entry(&self, options: &CacheOptions) -> CacheResult<EntryLock> {
        options.validate()?;
        let cache_root = options.resolve_cache_root();
        let path = options.entry_path();

        ensure_directory(&cache_root).await?;
        let mut entry = EntryLock::acquire(&path, options.lock_timeout).await?;

        match self.refresh_if_needed(&mut entry, options).await {
            Ok(()) => Ok(entry),
            Err(e) => {
                entry.release().await;
                Err(e)
            }
        }
    }

    /// Evaluate freshness and download into the locked entry when required
    async fn refresh_if_needed(
        &self,
        entry: &mut EntryLock,
        options: &CacheOptions,
    ) -> CacheResult<()> {
        let path = entry.path().to_path_buf();
        let status = inspect_entry(
            entry.file_mut(),
            options.key(),
            &path,
            options.update_interval,
        )
        .await?;

        if status.freshness.needs_refresh() {
            debug!("Cache entry {} is {}", path.display(), status.freshness);
            let body = self
                .fetcher
                .fetch(&options.url, options.download_timeout)
                .await?;
            overwrite(entry.file_mut(), &body)
                .await
                .map_err(|source| DownloadError::Write {
                    path: path.clone(),
                    source,
                })?;
            info!(
                "Cached {} bytes from {} in {}",
                body.len(),
                options.url,
                path.display()
            );
        }

        entry
            .file_mut()
            .seek(SeekFrom::Start(0))
            .await
            .map_err(|source| CacheError::Seek { path, source })?;
        Ok(())
    }

    /// Blocking counterpart of [`FileCache::refresh_if_needed`]
    fn refresh_if_needed_blocking(
        &self,
        entry: &mut BlockingEntryLock,
        options: &CacheOptions,
    ) -> CacheResult<()> {
        let path = entry.path().to_path_buf();
        let status = inspect_entry_blocking(
            entry.file_mut(),
            options.key(),
            &path,
            options.update_interval,
        )?;

        if status.freshness.needs_refresh() {
            debug!("Cache entry {} is {}", path.display(), status.freshness);
            let body = self.fetch_blocking(options)?;
            overwrite_blocking(entry.file_mut(), &body).map_err(|source| {
                DownloadError::Write {
                    path: path.clone(),
                    source,
                }
            })?;
            info!(
                "Cached {} bytes from {} in {}",
                body.len(),
                options.url,
                path.display()
            );
        }

        entry
            .file_mut()
            .seek(SeekFrom::Start(0))
            .map_err(|source| CacheError::Seek { path, source })?;
        Ok(())
    }

    /// Download on a helper thread that owns a private runtime
    ///
    /// The calling thread may itself belong to a runtime (a `spawn_blocking`
    /// thread, say), where tokio refuses to start another one.
    fn fetch_blocking(&self, options: &CacheOptions) -> CacheResult<Vec<u8>> {
        std::thread::scope(|scope| {
            let download = scope.spawn(|| -> CacheResult<Vec<u8>> {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(CacheError::Runtime)?;
                let body = runtime.block_on(
                    self.fetcher
                        .fetch(&options.url, options.download_timeout),
                )?;
                Ok(body)
            });
            download
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
        })
    }
}

/// Replace the entry content with `body`
///
/// New bytes are written over the old ones and the file is then cut to the
/// new length. If any step fails the entry is emptied so the next holder sees
/// it as absent instead of serving a torn mix.
async fn overwrite(file: &mut File, body: &[u8]) -> std::io::Result<()> {
    match write_body(file, body).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Err(truncate_error) = file.set_len(0).await {
                warn!(
                    "Failed to empty cache entry after write error: {}",
                    truncate_error
                );
            }
            Err(e)
        }
    }
}

async fn write_body(file: &mut File, body: &[u8]) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(0)).await?;
    file.write_all(body).await?;
    file.flush().await?;
    file.set_len(body.len() as u64).await?;
    file.sync_all().await
}

/// Blocking counterpart of [`overwrite`]
fn overwrite_blocking(file: &mut StdFile, body: &[u8]) -> std::io::Result<()> {
    let written = file
        .seek(SeekFrom::Start(0))
        .and_then(|_| file.write_all(body))
        .and_then(|()| file.flush())
        .and_then(|()| file.set_len(body.len() as u64))
        .and_then(|()| file.sync_all());

    if let Err(e) = written {
        if let Err(truncate_error) = file.set_len(0) {
            warn!(
                "Failed to empty cache entry after write error: {}",
                truncate_error
            );
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LockError;
    use std::time::Duration;
    use tempfile::TempDir;

    fn options_in(temp_dir: &TempDir) -> CacheOptions {
        // Port 9 (discard) on loopback; nothing in these tests reaches it
        CacheOptions::parse("http://127.0.0.1:9/download")
            .unwrap()
            .with_cache_root(temp_dir.path())
    }

    #[tokio::test]
    async fn test_overwrite_truncates_longer_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("entry.cache");
        std::fs::write(&path, b"a much longer previous body").unwrap();

        let mut file = tokio::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .await
            .unwrap();
        overwrite(&mut file, b"short").await.unwrap();
        drop(file);

        assert_eq!(std::fs::read(&path).unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_fresh_entry_served_without_network() {
        let temp_dir = TempDir::new().unwrap();
        let options = options_in(&temp_dir);
        std::fs::write(options.entry_path(), b"cached").unwrap();

        let content = FileCache::new().get_bytes(&options).await.unwrap();
        assert_eq!(content, b"cached");
    }

    #[tokio::test]
    async fn test_entry_path_validates_options() {
        let cache = FileCache::new();
        let options = CacheOptions::new(url::Url::parse("ftp://x/file").unwrap());
        assert!(matches!(
            cache.entry_path(&options),
            Err(CacheError::InvalidOptions { .. })
        ));
    }

    #[tokio::test]
    async fn test_callback_error_returned_unchanged_and_lock_released() {
        #[derive(Debug, PartialEq)]
        enum CallerError {
            Cache(String),
            Parse(&'static str),
        }
        impl From<CacheError> for CallerError {
            fn from(e: CacheError) -> Self {
                CallerError::Cache(e.to_string())
            }
        }

        let temp_dir = TempDir::new().unwrap();
        let options = options_in(&temp_dir).with_lock_timeout(Duration::ZERO);
        std::fs::write(options.entry_path(), b"cached").unwrap();

        let cache = FileCache::new();
        let result: Result<(), CallerError> = cache
            .get_stream_async(&options, |_file| {
                async { Err(CallerError::Parse("bad data")) }.boxed()
            })
            .await;
        assert_eq!(result, Err(CallerError::Parse("bad data")));

        // A zero lock timeout only succeeds if the entry was released
        assert_eq!(cache.get_bytes(&options).await.unwrap(), b"cached");
    }

    #[tokio::test]
    async fn test_lock_timeout_when_held() {
        let temp_dir = TempDir::new().unwrap();
        let options = options_in(&temp_dir).with_lock_timeout(Duration::from_millis(300));
        let _holder = EntryLock::acquire(&options.entry_path(), Duration::ZERO)
            .await
            .unwrap();

        let result = FileCache::new().get_bytes(&options).await;
        assert!(matches!(
            result,
            Err(CacheError::Lock(LockError::Timeout { .. }))
        ));
    }

    #[tokio::test]
    async fn test_inspect_does_not_download() {
        let temp_dir = TempDir::new().unwrap();
        let options = options_in(&temp_dir);

        let status = FileCache::new().inspect(&options).await.unwrap();
        assert_eq!(status.size, 0);
        assert!(status.freshness.needs_refresh());
        assert_eq!(status.path, options.entry_path());
        assert_eq!(status.key, options.key());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_surface_runs_on_spawn_blocking_thread() {
        let temp_dir = TempDir::new().unwrap();
        let options = options_in(&temp_dir);
        std::fs::write(options.entry_path(), b"cached").unwrap();

        let cache = FileCache::new();
        let content = tokio::task::spawn_blocking(move || cache.get_bytes_blocking(&options))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(content, b"cached");
    }

    #[test]
    fn test_blocking_download_failure_releases_lock() {
        let temp_dir = TempDir::new().unwrap();
        let options = options_in(&temp_dir).with_download_timeout(Duration::from_millis(200));
        let cache = FileCache::with_client_config(
            ClientConfig::default().with_retry(1, Duration::from_millis(10)),
        );

        let result = cache.get_bytes_blocking(&options);
        assert!(matches!(
            result,
            Err(CacheError::Download(DownloadError::AttemptsExhausted { .. }))
        ));
        assert!(BlockingEntryLock::acquire(&options.entry_path(), Duration::ZERO).is_ok());
    }

    #[test]
    fn test_blocking_overwrite_truncates_longer_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("entry.cache");
        std::fs::write(&path, b"a much longer previous body").unwrap();

        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .unwrap();
        overwrite_blocking(&mut file, b"short").unwrap();
        drop(file);

        assert_eq!(std::fs::read(&path).unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_cache_root_that_is_a_file_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("not-a-directory");
        std::fs::write(&root, b"occupied").unwrap();
        let options = options_in(&temp_dir).with_cache_root(root.clone());

        let result = FileCache::new().get_bytes(&options).await;
        assert!(matches!(
            result,
            Err(CacheError::Lock(LockError::DirectoryUnavailable { .. }))
        ));
    }

    #[test]
    fn test_blocking_serves_fresh_entry() {
        let temp_dir = TempDir::new().unwrap();
        let options = options_in(&temp_dir);
        std::fs::write(options.entry_path(), b"cached").unwrap();

        let cache = FileCache::new();
        let content = cache
            .get_stream(&options, |file| {
                let mut content = String::new();
                file.read_to_string(&mut content)?;
                Ok::<_, Box<dyn std::error::Error + Send + Sync>>(content)
            })
            .unwrap();
        assert_eq!(content, "cached");
    }
}
