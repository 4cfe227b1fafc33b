//! Change-aware acquisition of the national extract
//!
//! Each run fetches the index page, reads its change marker and compares it
//! with the marker stored beside the local artifact. The extract is only
//! downloaded when the markers differ or the artifact is missing, and the new
//! marker is only stored after the download succeeded, so a failed transfer
//! is retried on the next run.
//!
//! The marker is taken from free page text and is trusted as-is: a file that
//! changes without its marker changing is not detected.

use std::path::{Path, PathBuf};

use tracing::info;
use url::Url;

use crate::app::cache::{ChangeCache, ChangeRecord};
use crate::app::client::RemoteSource;
use crate::app::extract::{DateExtractor, LinkExtractor};
use crate::app::models::{ArtifactFormat, ChangeMarker, LocalArtifact, RemoteDataset};
use crate::errors::Result;

/// Stage name recorded on the downloaded artifact
pub const DOWNLOAD_STAGE: &str = "DOWNLOAD";

/// What the acquisition run had to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionOutcome {
    /// Remote marker matched the stored one; nothing was transferred
    Unchanged,
    /// The extract was (re)downloaded
    Downloaded { dataset: RemoteDataset, bytes: u64 },
}

/// Result of one acquisition run
#[derive(Debug, Clone)]
pub struct Acquisition {
    /// Local copy of the extract
    pub artifact: LocalArtifact,
    /// Marker currently published on the index page
    pub change_marker: ChangeMarker,
    pub outcome: AcquisitionOutcome,
}

impl Acquisition {
    pub fn was_downloaded(&self) -> bool {
        matches!(self.outcome, AcquisitionOutcome::Downloaded { .. })
    }
}

/// Downloads the `.osm.pbf` extract for one country when it has changed
#[derive(Debug)]
pub struct ProtobufDownloader<S> {
    source: S,
    page_url: Url,
    link_extractor: LinkExtractor,
    date_extractor: DateExtractor,
    cache: ChangeCache,
}

impl<S: RemoteSource> ProtobufDownloader<S> {
    /// Creates a downloader writing to `target_path`
    ///
    /// # Errors
    ///
    /// Returns an extraction error if the country produces an invalid pattern
    pub fn new(
        source: S,
        page_url: Url,
        country: impl Into<String>,
        target_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            source,
            page_url,
            link_extractor: LinkExtractor::new(country)?,
            date_extractor: DateExtractor::new()?,
            cache: ChangeCache::for_artifact(target_path),
        })
    }

    pub fn target_path(&self) -> &Path {
        self.cache.artifact_path()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Runs the acquisition and returns the local artifact
    ///
    /// # Errors
    ///
    /// Fetch, extraction, download and change-record errors propagate
    /// unchanged; none of them is retried.
    pub async fn run(&self) -> Result<Acquisition> {
        let stored = self.cache.stored_marker().await?;

        let html = self.source.fetch_page(&self.page_url).await?;
        let current = self.date_extractor.extract(&html)?;

        let artifact = LocalArtifact::new(self.target_path(), ArtifactFormat::Pbf, DOWNLOAD_STAGE);

        if stored.as_ref() == Some(&current) && artifact.exists() {
            info!(
                "{} is current (marker {}), skipping download",
                artifact.path.display(),
                current
            );
            return Ok(Acquisition {
                artifact,
                change_marker: current,
                outcome: AcquisitionOutcome::Unchanged,
            });
        }

        match &stored {
            Some(previous) => info!("Remote extract changed: {} -> {}", previous, current),
            None => info!("No valid change record for {}", artifact.path.display()),
        }

        let url = self.link_extractor.extract(&html, &self.page_url)?;
        info!("Downloading {} to {}", url, artifact.path.display());
        let bytes = self.source.download(&url, &artifact.path).await?;

        let country = self.link_extractor.country().to_string();
        self.cache
            .store(&ChangeRecord::new(country.clone(), current.clone()))
            .await?;

        Ok(Acquisition {
            artifact,
            change_marker: current.clone(),
            outcome: AcquisitionOutcome::Downloaded {
                dataset: RemoteDataset {
                    url,
                    country_code: country,
                    change_marker: current,
                },
                bytes,
            },
        })
    }
}
