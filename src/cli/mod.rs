//! Command-line interface components
//!
//! This module contains CLI-specific code for the remote-file-cache binary:
//! argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{
    parse_duration, Cli, Commands, ConfigAction, ConfigArgs, FetchArgs, GlobalArgs, InspectArgs,
    KeyArgs,
};
pub use commands::{handle_config, handle_fetch, handle_inspect, handle_key};
