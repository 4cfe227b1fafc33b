//! Error types for OSM Router
//!
//! This module defines the error taxonomy for every stage of the pipeline.
//! Errors carry the offending URL, path or command line together with any
//! captured diagnostic output so the operator can fix the environment and rerun.

use std::path::PathBuf;
use thiserror::Error;

/// Remote page retrieval errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed before a response was received
    #[error("HTTP request for {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("Server error fetching {url}: HTTP {status}")]
    ServerError { url: String, status: u16 },

    /// Page fetch exceeded its time budget
    #[error("Fetching {url} timed out after {seconds} seconds")]
    Timeout { url: String, seconds: u64 },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),
}

/// Errors raised when expected content is absent from a fetched page
#[derive(Error, Debug)]
pub enum ExtractError {
    /// No anchor matched `<country>-latest*.(osm|pbf)`
    #[error("Download link not found for country '{country}'")]
    LinkNotFound { country: String },

    /// No `YYYY-MM-DDTHH:MM:SSZ` timestamp in the page text
    #[error("No change marker (YYYY-MM-DDTHH:MM:SSZ) found in page content")]
    MarkerNotFound,

    /// Search pattern could not be compiled
    #[error("Invalid search pattern '{pattern}': {error}")]
    InvalidPattern { pattern: String, error: String },

    /// Base URL or href could not be resolved to an absolute URL
    #[error("Cannot resolve '{href}' against base URL '{base}': {error}")]
    InvalidUrl {
        base: String,
        href: String,
        error: String,
    },
}

/// File transfer errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations
    #[error("File I/O error")]
    Io(#[from] std::io::Error),

    /// Server returned error status
    #[error("Server error downloading {url}: HTTP {status}")]
    ServerError { url: String, status: u16 },

    /// Incomplete download
    #[error("Incomplete download: received {received} bytes, expected {expected} bytes")]
    IncompleteDownload { received: u64, expected: u64 },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Change-marker sidecar errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// I/O error reading or writing the sidecar
    #[error("Change record I/O error")]
    Io(#[from] std::io::Error),

    /// Sidecar content is not a valid change record
    #[error("Change record {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// External tool resolution, configuration and execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    /// No executable found for the current environment
    #[error("No '{tool}' executable found in {directory}")]
    MissingBinary { tool: String, directory: PathBuf },

    /// Binary directory could not be read
    #[error("Cannot read binary directory {directory}")]
    BinaryDirectory {
        directory: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stage option assigned a value of the wrong type
    #[error("Invalid value for option '{option}': expected {expected}, found {found}")]
    InvalidConfig {
        option: String,
        expected: &'static str,
        found: String,
    },

    /// Stage option name not recognised
    #[error("Unknown option '{option}'")]
    UnknownOption { option: String },

    /// Process could not be launched at all
    #[error("Failed to launch '{command}'")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited with a non-zero status
    #[error("'{command}' exited with status {exit_code:?}\nstdout: {stdout}\nstderr: {stderr}")]
    Execution {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

/// Stage sequencing errors
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Required input artifact is absent
    #[error("Stage {stage} cannot start: input artifact {path} does not exist")]
    MissingArtifact { stage: String, path: PathBuf },

    /// Could not prepare an output directory
    #[error("Failed to prepare directory {path}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read or written
    #[error("Configuration file I/O error: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// No per-user configuration directory on this platform
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Page fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Page content error
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Change record error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// External tool error
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Stage sequencing error
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => "fetch",
            AppError::Extract(_) => "extract",
            AppError::Download(_) => "download",
            AppError::Cache(_) => "cache",
            AppError::Tool(_) => "tool",
            AppError::Pipeline(_) => "pipeline",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Extraction result type alias
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Tool result type alias
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
