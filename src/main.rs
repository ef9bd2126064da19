//! remote-file-cache CLI application
//!
//! Command-line interface for fetching remote files through the shared
//! on-disk cache. Content goes to stdout (or a file); logs go to stderr.

use std::process;

use tracing::{debug, info};
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::{fmt, EnvFilter};

// Import CLI modules through the library
use remote_file_cache::cli::{
    handle_config, handle_fetch, handle_inspect, handle_key, Cli, Commands,
};
use remote_file_cache::config::AppConfig;
use remote_file_cache::constants::logging;
use remote_file_cache::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    // Config commands must work even when the config file is broken
    let config = match cli.command {
        Commands::Config(_) => AppConfig::default(),
        _ => AppConfig::load(cli.global.config.clone()).await?,
    };

    init_logging(&cli.log_level(&config.logging.level), cli.global.very_verbose);
    info!("remote-file-cache v{} starting", env!("CARGO_PKG_VERSION"));
    debug!("Effective configuration: {:?}", config);

    let Cli { global, command } = cli;
    match command {
        Commands::Fetch(args) => {
            info!("Executing fetch command");
            handle_fetch(&global, &config, args).await
        }
        Commands::Key(args) => handle_key(&global, &config, args).await,
        Commands::Inspect(args) => {
            info!("Executing inspect command");
            handle_inspect(&global, &config, args).await
        }
        Commands::Config(args) => handle_config(&global, args).await,
    }
}

/// Initialize logging on stderr so stdout can carry cached content
fn init_logging(level: &str, show_level: bool) {
    let directive = format!("{}={}", logging::CRATE_TARGET, level)
        .parse::<Directive>()
        .unwrap_or_else(|_| LevelFilter::WARN.into());

    let filter = EnvFilter::from_default_env().add_directive(directive);

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(show_level)
        .init();
}
