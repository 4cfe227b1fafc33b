//! Command-line argument parsing for OSM Router
//!
//! This module defines the CLI structure using clap derive macros: the full
//! pipeline run, acquisition on its own, tool diagnostics, data cleanup and
//! configuration management.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// OSM Router - Build a street routing database from OpenStreetMap extracts
#[derive(Parser, Debug)]
#[command(
    name = "osm_router",
    version,
    about = "Build a street routing database from a national OpenStreetMap extract",
    long_about = "Downloads a national OpenStreetMap extract when it has changed, filters it down to
the road network with the bundled osmtools binaries and builds a spatialite routing database."
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
#[derive(Args, Debug, Clone)]
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
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download, convert and filter the extract, then build the routing database
    Run(SourceArgs),

    /// Only download the extract if it has changed
    Download(SourceArgs),

    /// Show the host environment and the binary chosen for each tool
    Resolve,

    /// List (and with --confirm, delete) downloaded and processed data
    Clean(CleanArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Overrides for the configured data source
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Country whose extract is used (e.g., "brazil")
    #[arg(short, long)]
    pub country: Option<String>,

    /// Index page listing the extract
    #[arg(short, long, value_name = "URL")]
    pub url: Option<String>,
}

/// Arguments for the clean command
#[derive(Args, Debug, Clone)]
pub struct CleanArgs {
    /// Actually delete the listed directories
    #[arg(long)]
    pub confirm: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Destination (defaults to the per-user config location)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Level requested by the verbosity flags, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl SourceArgs {
    /// Rejects empty overrides
    pub fn validate(&self) -> Result<(), String> {
        if matches!(&self.country, Some(country) if country.trim().is_empty()) {
            return Err("Country must not be empty".to_string());
        }
        if matches!(&self.url, Some(url) if url.trim().is_empty()) {
            return Err("URL must not be empty".to_string());
        }
        Ok(())
    }
}
