//! Configuration management for remote-file-cache
//!
//! This module provides configuration loading for the CLI with multi-source
//! lookup and zero-config defaults. Durations are written as human-readable
//! strings such as `"1day"` or `"30s"`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::app::{CacheOptions, ClientConfig};
use crate::constants::{cache, config, http, limits, logging};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Cache entry settings
    pub cache: CacheSettings,
    /// HTTP client settings
    pub client: ClientSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Cache directory path (platform data directory if unset)
    pub cache_root: Option<PathBuf>,
    /// Maximum age of an entry before it is refreshed
    #[serde(with = "humantime_serde")]
    pub update_interval: Duration,
    /// Total time spent waiting for an entry lock
    #[serde(with = "humantime_serde")]
    pub lock_timeout: Duration,
    /// Per-attempt download timeout (unbounded if unset)
    #[serde(with = "humantime_serde")]
    pub download_timeout: Option<Duration>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            cache_root: None,
            update_interval: cache::DEFAULT_UPDATE_INTERVAL,
            lock_timeout: cache::DEFAULT_LOCK_TIMEOUT,
            download_timeout: None,
        }
    }
}

/// TOML-friendly client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// User agent override
    pub user_agent: Option<String>,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Total download attempts, first try included
    pub max_attempts: u32,
    /// Linear backoff step between attempts
    #[serde(with = "humantime_serde")]
    pub retry_step: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            user_agent: None,
            connect_timeout: http::CONNECT_TIMEOUT,
            tcp_nodelay: true,
            max_attempts: limits::MAX_ATTEMPTS,
            retry_step: limits::RETRY_STEP,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Explicit config file (must exist)
    /// 2. First config file found in the standard locations
    /// 3. Default values
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        match config_path {
            Some(path) => Self::load_from_file(&path).await,
            None => {
                debug!("Using default configuration");
                Ok(Self::default())
            }
        }
    }

    /// Write a commented default config file
    ///
    /// Returns the path written to. An existing file is only replaced when
    /// `force` is set.
    pub async fn initialize(path: Option<PathBuf>, force: bool) -> ConfigResult<PathBuf> {
        let config_path = match path {
            Some(path) => path,
            None => Self::default_config_path()?,
        };

        if config_path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                field: "path".to_string(),
                value: config_path.display().to_string(),
                reason: "Configuration file already exists; use --force to overwrite".to_string(),
            });
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| ConfigError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: config_path.clone(),
                source,
            })?;

        info!("Created configuration file: {}", config_path.display());
        Ok(config_path)
    }

    /// Find configuration file in standard locations
    pub fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(".").join(config::LOCAL_FILE_NAME)];
        if let Ok(user_config) = Self::default_config_path() {
            search_paths.push(user_config);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(cache::APP_DIR).join(config::FILE_NAME))
    }

    /// Load configuration from a TOML file
    pub async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        config.client_config().validate()?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Build per-request options for a URL from the cache settings
    pub fn options_for(&self, url: Url) -> CacheOptions {
        let mut options = CacheOptions::new(url)
            .with_update_interval(self.cache.update_interval)
            .with_lock_timeout(self.cache.lock_timeout);

        if let Some(root) = &self.cache.cache_root {
            options = options.with_cache_root(root.clone());
        }
        if let Some(timeout) = self.cache.download_timeout {
            options = options.with_download_timeout(timeout);
        }
        options
    }

    /// Convert the client settings to a runtime `ClientConfig`
    pub fn client_config(&self) -> ClientConfig {
        let mut client = ClientConfig::default()
            .with_retry(self.client.max_attempts, self.client.retry_step);
        if let Some(user_agent) = &self.client.user_agent {
            client = client.with_user_agent(user_agent.as_str());
        }
        client.connect_timeout = self.client.connect_timeout;
        client.tcp_nodelay = self.client.tcp_nodelay;
        client
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# remote-file-cache configuration
# Durations accept human-readable values such as "30s", "5m" or "1day".

[cache]
# Cache directory (leave unset to use the platform data directory)
# cache_root = "/path/to/custom/cache"

# Maximum age of an entry before it is downloaded again
update_interval = "1day"

# Total time to wait for another process holding the same entry
lock_timeout = "30s"

# Per-attempt download timeout (unbounded if unset)
# download_timeout = "2m"

[client]
# user_agent = "my-tool/1.0"
connect_timeout = "30s"
tcp_nodelay = true

# Total download attempts and linear backoff step between them
max_attempts = {}
retry_step = "1s"

[logging]
level = "{}"  # error, warn, info, debug, trace
"#,
            limits::MAX_ATTEMPTS,
            logging::DEFAULT_LOG_LEVEL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_creation() {
        let config = AppConfig::default();

        assert_eq!(config.cache.update_interval, cache::DEFAULT_UPDATE_INTERVAL);
        assert_eq!(config.cache.lock_timeout, cache::DEFAULT_LOCK_TIMEOUT);
        assert_eq!(config.cache.download_timeout, None);
        assert_eq!(config.client.max_attempts, 3);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_generated_content_parses_to_defaults() {
        let content = AppConfig::generate_default_config_content();
        let parsed: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
[cache]
update_interval = "2s"
download_timeout = "10s"
"#,
        )
        .unwrap();

        assert_eq!(parsed.cache.update_interval, Duration::from_secs(2));
        assert_eq!(parsed.cache.download_timeout, Some(Duration::from_secs(10)));
        assert_eq!(parsed.cache.lock_timeout, cache::DEFAULT_LOCK_TIMEOUT);
        assert_eq!(parsed.client, ClientSettings::default());
    }

    #[test]
    fn test_options_for_applies_settings() {
        let mut config = AppConfig::default();
        config.cache.cache_root = Some(PathBuf::from("/tmp/entries"));
        config.cache.update_interval = Duration::from_secs(60);
        config.cache.download_timeout = Some(Duration::from_secs(5));

        let url = Url::parse("https://example.com/download").unwrap();
        let options = config.options_for(url);

        assert_eq!(options.cache_root, Some(PathBuf::from("/tmp/entries")));
        assert_eq!(options.update_interval, Duration::from_secs(60));
        assert_eq!(options.download_timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.lock_timeout, cache::DEFAULT_LOCK_TIMEOUT);
    }

    #[test]
    fn test_client_config_conversion() {
        let mut config = AppConfig::default();
        config.client.user_agent = Some("tester/2.0".to_string());
        config.client.max_attempts = 5;
        config.client.retry_step = Duration::from_millis(250);

        let client = config.client_config();
        assert_eq!(client.user_agent, "tester/2.0");
        assert_eq!(client.max_attempts, 5);
        assert_eq!(client.backoff_for(2), Duration::from_millis(500));

        let default_client = AppConfig::default().client_config();
        assert_eq!(default_client, ClientConfig::default());
    }

    #[tokio::test]
    async fn test_load_missing_explicit_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");

        let result = AppConfig::load(Some(missing)).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        tokio::fs::write(&path, "[cache]\nlock_timeout = \"5s\"\n")
            .await
            .unwrap();

        let config = AppConfig::load(Some(path)).await.unwrap();
        assert_eq!(config.cache.lock_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        tokio::fs::write(&path, "[client]\nmax_attempts = 0\n")
            .await
            .unwrap();
        assert!(matches!(
            AppConfig::load_from_file(&path).await,
            Err(ConfigError::InvalidValue { .. })
        ));

        tokio::fs::write(&path, "[cache]\nupdate_interval = \"soon\"\n")
            .await
            .unwrap();
        assert!(matches!(
            AppConfig::load_from_file(&path).await,
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_initialize_writes_and_protects_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let written = AppConfig::initialize(Some(path.clone()), false)
            .await
            .unwrap();
        assert_eq!(written, path);
        assert_eq!(
            AppConfig::load_from_file(&path).await.unwrap(),
            AppConfig::default()
        );

        // Second run refuses without force
        assert!(AppConfig::initialize(Some(path.clone()), false)
            .await
            .is_err());
        assert!(AppConfig::initialize(Some(path), true).await.is_ok());
    }
}
