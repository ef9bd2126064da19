//! Command-line argument parsing for remote-file-cache
//!
//! This module defines the CLI structure using clap derive macros,
//! providing a small interface for fetching resources through the cache,
//! inspecting entries and managing the configuration file.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::IntoDeserializer;

/// remote-file-cache - Keep a local copy of a remote file
#[derive(Parser, Debug)]
#[command(
    name = "remote-file-cache",
    version,
    about = "Fetch a remote file through a shared on-disk cache",
    long_about = "Fetches a remote file through an on-disk cache shared by every process of the user.
Concurrent invocations for the same resource wait for each other, so the file is downloaded at most once per update interval."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cache directory path
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a resource through the cache
    Fetch(FetchArgs),

    /// Show the cache key and entry path for a URL
    Key(KeyArgs),

    /// Show the state of a cache entry without downloading
    Inspect(InspectArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// URL of the resource
    #[arg(value_name = "URL")]
    pub url: String,

    /// Write the content to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Maximum age of the cached copy (e.g. "10m", "1day")
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub update_interval: Option<Duration>,

    /// How long to wait for another process using the same entry
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub lock_timeout: Option<Duration>,

    /// Timeout for each download attempt
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub download_timeout: Option<Duration>,
}

/// Arguments for the key command
#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// URL of the resource
    #[arg(value_name = "URL")]
    pub url: String,
}

/// Arguments for the inspect command
#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// URL of the resource
    #[arg(value_name = "URL")]
    pub url: String,

    /// Update interval to judge freshness against
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub update_interval: Option<Duration>,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show where configuration is read from
    Path,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the log level directive from the flags, falling back to `configured`
    pub fn log_level(&self, configured: &str) -> String {
        if self.global.quiet {
            "error".to_string()
        } else if self.global.very_verbose {
            "debug".to_string()
        } else if self.global.verbose {
            "info".to_string()
        } else {
            configured.to_string()
        }
    }
}

/// Parse a human-readable duration such as "30s" or "1day"
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let deserializer: StrDeserializer<'_, ValueError> = value.into_deserializer();
    humantime_serde::deserialize(deserializer).map_err(|e| e.to_string())
}
