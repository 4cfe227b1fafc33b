//! Change-marker cache stored as a JSON sidecar next to the artifact
//!
//! The sidecar for `brazil-latest.osm.pbf` is `brazil-latest.osm.pbf.json`.
//! A record only counts while its artifact exists: if the artifact has been
//! deleted the record is stale and the next run downloads again, even though
//! the sidecar is still on disk.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::app::models::ChangeMarker;
use crate::constants::paths;
use crate::errors::{CacheError, CacheResult};

/// Last observed marker for a downloaded artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Country the artifact covers
    #[serde(default)]
    pub country_code: String,
    /// Marker seen when the artifact was downloaded
    #[serde(rename = "marker")]
    pub last_marker: ChangeMarker,
    /// When the record was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl ChangeRecord {
    /// Creates a record stamped with the current time
    pub fn new(country_code: impl Into<String>, last_marker: ChangeMarker) -> Self {
        Self {
            country_code: country_code.into(),
            last_marker,
            recorded_at: Some(Utc::now()),
        }
    }
}

/// Reads and writes the change record paired with one artifact path
#[derive(Debug, Clone)]
pub struct ChangeCache {
    artifact_path: PathBuf,
    sidecar_path: PathBuf,
}

impl ChangeCache {
    /// Cache for the artifact at `artifact_path`
    pub fn for_artifact(artifact_path: impl Into<PathBuf>) -> Self {
        let artifact_path = artifact_path.into();
        let sidecar_path = sidecar_path_for(&artifact_path);
        Self {
            artifact_path,
            sidecar_path,
        }
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub fn sidecar_path(&self) -> &Path {
        &self.sidecar_path
    }

    /// Reads the sidecar as-is, without checking the artifact
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Corrupt` when the sidecar is not a change record
    pub async fn load(&self) -> CacheResult<Option<ChangeRecord>> {
        let content = match fs::read_to_string(&self.sidecar_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io(e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CacheError::Corrupt {
                path: self.sidecar_path.clone(),
                reason: e.to_string(),
            })
    }

    /// Marker the next run should compare against
    ///
    /// `None` when there is no record, when the record is unreadable, or when
    /// the artifact it describes is gone.
    pub async fn stored_marker(&self) -> CacheResult<Option<ChangeMarker>> {
        if !self.artifact_path.is_file() {
            debug!(
                "Artifact {} missing, ignoring any change record",
                self.artifact_path.display()
            );
            return Ok(None);
        }

        match self.load().await {
            Ok(record) => Ok(record.map(|r| r.last_marker)),
            Err(CacheError::Corrupt { path, reason }) => {
                warn!(
                    "Ignoring corrupt change record {}: {}",
                    path.display(),
                    reason
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Replaces the record, writing through a temporary file
    pub async fn store(&self, record: &ChangeRecord) -> CacheResult<()> {
        if let Some(parent) = self.sidecar_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(record).map_err(|e| CacheError::Corrupt {
            path: self.sidecar_path.clone(),
            reason: e.to_string(),
        })?;

        let temp_path = append_suffix(&self.sidecar_path, paths::TEMP_FILE_SUFFIX);
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, &self.sidecar_path).await?;

        debug!(
            "Stored change marker {} in {}",
            record.last_marker,
            self.sidecar_path.display()
        );
        Ok(())
    }
}

/// Sidecar path for an artifact: the artifact name plus `.json`
pub fn sidecar_path_for(artifact_path: &Path) -> PathBuf {
    append_suffix(artifact_path, paths::SIDECAR_SUFFIX)
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
