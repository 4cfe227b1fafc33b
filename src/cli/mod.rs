//! Command-line interface components
//!
//! This module contains CLI-specific code for the OSM Router application:
//! argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{CleanArgs, Cli, Commands, ConfigAction, ConfigArgs, GlobalArgs, SourceArgs};
pub use commands::{handle_clean, handle_config, handle_download, handle_resolve, handle_run};
