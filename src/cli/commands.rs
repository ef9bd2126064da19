//! Command handlers for the remote-file-cache CLI
//!
//! This module implements the command handlers that turn CLI arguments and
//! the loaded configuration into cache requests.

use futures::FutureExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::app::{CacheOptions, FileCache};
use crate::cli::{ConfigAction, ConfigArgs, FetchArgs, GlobalArgs, InspectArgs, KeyArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, CacheError, Result};

/// Handle the fetch command
///
/// Streams the cached content to the output file, or to stdout when no file
/// is given.
pub async fn handle_fetch(global: &GlobalArgs, config: &AppConfig, args: FetchArgs) -> Result<()> {
    let mut options = build_options(global, config, &args.url)?;
    if let Some(interval) = args.update_interval {
        options = options.with_update_interval(interval);
    }
    if let Some(timeout) = args.lock_timeout {
        options = options.with_lock_timeout(timeout);
    }
    if let Some(timeout) = args.download_timeout {
        options = options.with_download_timeout(timeout);
    }

    let cache = FileCache::with_client_config(config.client_config());
    let output = args.output.clone();

    let written = cache
        .get_stream_async(&options, move |file| {
            async move {
                match output {
                    Some(path) => {
                        let mut out = tokio::fs::File::create(&path).await?;
                        let written = tokio::io::copy(file, &mut out).await?;
                        out.flush().await?;
                        Ok::<_, AppError>(written)
                    }
                    None => {
                        let mut stdout = tokio::io::stdout();
                        let written = tokio::io::copy(file, &mut stdout).await?;
                        stdout.flush().await?;
                        Ok(written)
                    }
                }
            }
            .boxed()
        })
        .await?;

    info!("Served {} bytes for {}", written, options.url);
    if let Some(path) = args.output {
        if !global.quiet {
            println!("Saved {} bytes to {}", written, path.display());
        }
    }
    Ok(())
}

/// Handle the key command
pub async fn handle_key(global: &GlobalArgs, config: &AppConfig, args: KeyArgs) -> Result<()> {
    let options = build_options(global, config, &args.url)?;
    let cache = FileCache::new();

    println!("{}", options.key());
    println!("{}", cache.entry_path(&options)?.display());
    Ok(())
}

/// Handle the inspect command
pub async fn handle_inspect(
    global: &GlobalArgs,
    config: &AppConfig,
    args: InspectArgs,
) -> Result<()> {
    let mut options = build_options(global, config, &args.url)?;
    if let Some(interval) = args.update_interval {
        options = options.with_update_interval(interval);
    }

    let cache = FileCache::with_client_config(config.client_config());
    let status = cache.inspect(&options).await?;

    println!("Key:           {}", status.key);
    println!("Path:          {}", status.path.display());
    println!("Size:          {} bytes", status.size);
    match status.last_modified {
        Some(modified) => println!("Last modified: {}", modified.to_rfc3339()),
        None => println!("Last modified: -"),
    }
    println!("Freshness:     {}", status.freshness);
    Ok(())
}

/// Handle configuration management
pub async fn handle_config(global: &GlobalArgs, args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Init { force } => {
            let path = AppConfig::initialize(global.config.clone(), force).await?;
            if !global.quiet {
                println!("Created default configuration file:");
                println!("   {}", path.display());
                println!("   You can customize settings by editing this file.");
            }
            Ok(())
        }
        ConfigAction::Path => {
            let active = match &global.config {
                Some(path) => Some(path.clone()),
                None => AppConfig::find_config_file(),
            };
            match active {
                Some(path) => println!("Active config:  {}", path.display()),
                None => println!("Active config:  (defaults)"),
            }
            match AppConfig::default_config_path() {
                Ok(path) => println!("User config:    {}", path.display()),
                Err(e) => println!("User config:    unavailable ({})", e),
            }
            Ok(())
        }
    }
}

/// Build cache options for a URL from the config and global overrides
fn build_options(global: &GlobalArgs, config: &AppConfig, url: &str) -> Result<CacheOptions> {
    let url = Url::parse(url)
        .map_err(|e| CacheError::invalid_options(format!("invalid URL {}: {}", url, e)))?;

    let mut options = config.options_for(url);
    if let Some(cache_dir) = &global.cache_dir {
        options = options.with_cache_root(cache_dir.clone());
    }
    options.validate()?;

    debug!(
        "Cache entry for {} is {} under {}",
        options.url,
        options.key(),
        options.resolve_cache_root().display()
    );
    Ok(options)
}
