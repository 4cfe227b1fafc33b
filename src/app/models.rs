//! Data models for OSM Router
//!
//! This module defines the core data structures threaded through the
//! pipeline: the remote dataset being tracked, its change marker, and the
//! artifacts each stage produces.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

/// Opaque change token scraped from the remote index page
///
/// Only equality matters: two markers are the same dataset version when the
/// strings are identical. No ordering or date arithmetic is performed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeMarker(String);

impl ChangeMarker {
    /// Wraps a marker string verbatim
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    /// Marker text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote dataset observed on the index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDataset {
    /// Absolute download URL of the extract
    pub url: Url,
    /// Country the extract covers (e.g., "brazil")
    pub country_code: String,
    /// Change marker read from the page
    pub change_marker: ChangeMarker,
}

/// Geometry container formats exchanged between stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// Protocol buffer binary format (raw)
    Pbf,
    /// o5m format (intermediate)
    O5m,
    /// Spatial database produced by the network builders
    Sqlite,
}

impl ArtifactFormat {
    /// File extension and directory name for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pbf => "pbf",
            Self::O5m => "o5m",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A file produced by one stage and consumed by at most one later stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalArtifact {
    /// Location on disk
    pub path: PathBuf,
    /// Container format
    pub format: ArtifactFormat,
    /// Name of the stage that produced it
    pub stage_name: &'static str,
}

impl LocalArtifact {
    pub fn new(path: impl Into<PathBuf>, format: ArtifactFormat, stage_name: &'static str) -> Self {
        Self {
            path: path.into(),
            format,
            stage_name,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}
