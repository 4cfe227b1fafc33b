//! Core application logic for OSM Router
//!
//! This module contains the remote-source client, page extraction, the
//! change-marker cache, the external tool layer and the stage pipeline.
//!
//! # Examples
//!
//! ```rust,no_run
//! use osm_router::app::{
//!     BinaryResolver, ConvertOptions, GeofabrikClient, Pipeline, PipelineLayout, PipelineTools,
//! };
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = BinaryResolver::detect("modules/osmtools/bin");
//! let tools = PipelineTools::resolve(
//!     &resolver,
//!     ConvertOptions::default(),
//!     ConvertOptions::default(),
//! )?;
//!
//! let page = Url::parse("https://download.geofabrik.de/south-america/brazil.html")?;
//! let pipeline = Pipeline::new(
//!     GeofabrikClient::new()?,
//!     page,
//!     PipelineLayout::new("data", "brazil"),
//!     tools,
//! )?;
//!
//! let report = pipeline.run().await?;
//! println!("Database: {}", report.database_path().display());
//! # Ok(())
//! # }
//! ```

pub mod acquire;
pub mod cache;
pub mod client;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod tools;

// Re-export main public API
pub use acquire::{Acquisition, AcquisitionOutcome, ProtobufDownloader};
pub use cache::{ChangeCache, ChangeRecord};
pub use client::{ClientConfig, GeofabrikClient, RemoteSource};
pub use extract::{DateExtractor, LinkExtractor};
pub use models::{ArtifactFormat, ChangeMarker, LocalArtifact, RemoteDataset};
pub use pipeline::{Pipeline, PipelineLayout, PipelineReport, PipelineTools, Stage};
pub use tools::{BinaryResolver, ConvertOptions, HostEnvironment};
