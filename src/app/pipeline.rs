//! Sequential build of the street routing database
//!
//! Stages run strictly one after another:
//!
//! ```text
//! DOWNLOAD -> CONVERT_TO_INTERMEDIATE -> FILTER -> CONVERT_TO_RAW
//!          -> BUILD_NETWORK_TABLE -> BUILD_ROUTING_TABLE
//! ```
//!
//! Each stage clears its own output path, then consumes the artifact of its
//! predecessor and checks that it is on disk before launching anything. The first failure aborts the run;
//! artifacts produced so far are left in place for inspection. A rerun starts
//! again from DOWNLOAD, which is cheap while the remote extract is unchanged.

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use url::Url;

use crate::app::acquire::{Acquisition, ProtobufDownloader};
use crate::app::client::RemoteSource;
use crate::app::models::{ArtifactFormat, LocalArtifact};
use crate::app::tools::spatialite::{network_arguments, osm_net_arguments};
use crate::app::tools::{
    BinaryResolver, ConvertOptions, ExternalTool, NetworkLayout, OsmConvert, OsmFilter,
    SpatialiteTool, ToolInvocation, OSMCONVERT, OSMFILTER, SPATIALITE_NETWORK, SPATIALITE_OSM_NET,
};
use crate::constants::paths;
use crate::errors::{PipelineError, Result, ToolResult};

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Download,
    ConvertToIntermediate,
    Filter,
    ConvertToRaw,
    BuildNetworkTable,
    BuildRoutingTable,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Download,
        Stage::ConvertToIntermediate,
        Stage::Filter,
        Stage::ConvertToRaw,
        Stage::BuildNetworkTable,
        Stage::BuildRoutingTable,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Download => "DOWNLOAD",
            Stage::ConvertToIntermediate => "CONVERT_TO_INTERMEDIATE",
            Stage::Filter => "FILTER",
            Stage::ConvertToRaw => "CONVERT_TO_RAW",
            Stage::BuildNetworkTable => "BUILD_NETWORK_TABLE",
            Stage::BuildRoutingTable => "BUILD_ROUTING_TABLE",
        }
    }

    /// 1-based position, for progress messages
    pub fn ordinal(&self) -> usize {
        Self::ALL
            .iter()
            .position(|stage| stage == self)
            .map_or(0, |index| index + 1)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where every stage reads and writes, derived from the country name
///
/// ```text
/// <data>/<external>/pbf/<country>-latest.osm.pbf
/// <data>/<processed>/o5m/<country>-latest.osm.o5m
/// <data>/<processed>/o5m/<country>-latest.osm.filtered.streets.o5m
/// <data>/<processed>/pbf/<country>-latest.osm.filtered.streets.pbf
/// <data>/<processed>/streets/streets.sqlite
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineLayout {
    pub data_root: PathBuf,
    pub external_dir: String,
    pub processed_dir: String,
    pub database_file: String,
    pub country: String,
}

impl PipelineLayout {
    pub fn new(data_root: impl Into<PathBuf>, country: impl Into<String>) -> Self {
        Self {
            data_root: data_root.into(),
            external_dir: paths::EXTERNAL_DIR.to_string(),
            processed_dir: paths::PROCESSED_DIR.to_string(),
            database_file: paths::DATABASE_FILE.to_string(),
            country: country.into(),
        }
    }

    fn stem(&self) -> String {
        format!("{}-latest.osm", self.country)
    }

    fn external(&self, format: ArtifactFormat) -> PathBuf {
        self.data_root
            .join(&self.external_dir)
            .join(format.extension())
    }

    fn processed(&self, format: ArtifactFormat) -> PathBuf {
        self.data_root
            .join(&self.processed_dir)
            .join(format.extension())
    }

    /// Root of all downloaded artifacts
    pub fn external_root(&self) -> PathBuf {
        self.data_root.join(&self.external_dir)
    }

    /// Root of all stage outputs
    pub fn processed_root(&self) -> PathBuf {
        self.data_root.join(&self.processed_dir)
    }

    pub fn download(&self) -> PathBuf {
        self.external(ArtifactFormat::Pbf)
            .join(format!("{}.pbf", self.stem()))
    }

    pub fn intermediate(&self) -> PathBuf {
        self.processed(ArtifactFormat::O5m)
            .join(format!("{}.o5m", self.stem()))
    }

    pub fn filtered(&self) -> PathBuf {
        self.processed(ArtifactFormat::O5m)
            .join(format!("{}.{}.o5m", self.stem(), paths::FILTERED_INFIX))
    }

    pub fn filtered_raw(&self) -> PathBuf {
        self.processed(ArtifactFormat::Pbf)
            .join(format!("{}.{}.pbf", self.stem(), paths::FILTERED_INFIX))
    }

    pub fn database(&self) -> PathBuf {
        self.processed_root()
            .join(paths::DATABASE_DIR)
            .join(&self.database_file)
    }
}

/// Tool wrappers for every stage, resolved once up front
#[derive(Debug, Clone)]
pub struct PipelineTools {
    pub to_intermediate: OsmConvert,
    pub filter: OsmFilter,
    pub to_raw: OsmConvert,
    pub osm_net: SpatialiteTool,
    pub network: SpatialiteTool,
}

impl PipelineTools {
    /// Resolves all four binaries before any stage runs
    ///
    /// # Errors
    ///
    /// `ToolError::MissingBinary` for the first tool with no executable
    pub fn resolve(
        resolver: &BinaryResolver,
        to_intermediate: ConvertOptions,
        to_raw: ConvertOptions,
    ) -> ToolResult<Self> {
        let converter = ExternalTool::resolve(resolver, OSMCONVERT)?;
        Ok(Self {
            to_intermediate: OsmConvert::new(converter.clone(), to_intermediate),
            filter: OsmFilter::new(ExternalTool::resolve(resolver, OSMFILTER)?),
            to_raw: OsmConvert::new(converter, to_raw),
            osm_net: SpatialiteTool::new(ExternalTool::resolve(resolver, SPATIALITE_OSM_NET)?),
            network: SpatialiteTool::new(ExternalTool::resolve(resolver, SPATIALITE_NETWORK)?),
        })
    }
}

/// Outcome of a complete run
#[derive(Debug)]
pub struct PipelineReport {
    pub acquisition: Acquisition,
    /// Finished spatial database
    pub database: LocalArtifact,
    /// One entry per tool stage, in order
    pub invocations: Vec<(Stage, ToolInvocation)>,
}

impl PipelineReport {
    pub fn database_path(&self) -> &Path {
        self.database.path()
    }
}

/// Drives the six stages for one country
#[derive(Debug)]
pub struct Pipeline<S> {
    downloader: ProtobufDownloader<S>,
    layout: PipelineLayout,
    tools: PipelineTools,
    network: NetworkLayout,
}

impl<S: RemoteSource> Pipeline<S> {
    /// # Errors
    ///
    /// Fails if the country name cannot be turned into a link pattern
    pub fn new(source: S, page_url: Url, layout: PipelineLayout, tools: PipelineTools) -> Result<Self> {
        let downloader =
            ProtobufDownloader::new(source, page_url, layout.country.clone(), layout.download())?;
        Ok(Self {
            downloader,
            layout,
            tools,
            network: NetworkLayout::default(),
        })
    }

    pub fn with_network_layout(mut self, network: NetworkLayout) -> Self {
        self.network = network;
        self
    }

    pub fn layout(&self) -> &PipelineLayout {
        &self.layout
    }

    /// Runs every stage and returns the finished database
    ///
    /// # Errors
    ///
    /// The first failing stage's error, unchanged. Later stages do not run.
    pub async fn run(&self) -> Result<PipelineReport> {
        let mut invocations = Vec::with_capacity(Stage::ALL.len() - 1);

        announce(Stage::Download);
        let acquisition = self.downloader.run().await?;
        let raw = acquisition.artifact.path.clone();

        let stage = Stage::ConvertToIntermediate;
        announce(stage);
        let output = self.layout.intermediate();
        prepare(stage, &raw, &output).await?;
        let run = self.tools.to_intermediate.run(&raw, &output).await?;
        let intermediate = run.output;
        invocations.push((stage, run.invocation));

        let stage = Stage::Filter;
        announce(stage);
        let output = self.layout.filtered();
        prepare(stage, &intermediate, &output).await?;
        let run = self.tools.filter.run(&intermediate, &output).await?;
        let filtered = run.output;
        invocations.push((stage, run.invocation));

        let stage = Stage::ConvertToRaw;
        announce(stage);
        let output = self.layout.filtered_raw();
        prepare(stage, &filtered, &output).await?;
        let run = self.tools.to_raw.run(&filtered, &output).await?;
        let filtered_raw = run.output;
        invocations.push((stage, run.invocation));

        // The network loader also refuses to write into an existing database
        let stage = Stage::BuildNetworkTable;
        announce(stage);
        let database = self.layout.database();
        prepare(stage, &filtered_raw, &database).await?;
        let args = osm_net_arguments(&filtered_raw, &self.network.table, &database);
        invocations.push((stage, self.tools.osm_net.run(&args).await?));

        // Routing table is added to the database built by the previous stage
        let stage = Stage::BuildRoutingTable;
        announce(stage);
        require(stage, &database)?;
        let args = network_arguments(&database, &self.network);
        invocations.push((stage, self.tools.network.run(&args).await?));

        info!("Routing database ready at {}", database.display());
        Ok(PipelineReport {
            acquisition,
            database: LocalArtifact::new(database, ArtifactFormat::Sqlite, Stage::BuildRoutingTable.name()),
            invocations,
        })
    }
}

fn announce(stage: Stage) {
    info!("[{}/{}] {}", stage.ordinal(), Stage::ALL.len(), stage);
}

/// Fails fast when `input` is absent, without launching any process
fn require(stage: Stage, input: &Path) -> std::result::Result<(), PipelineError> {
    if input.is_file() {
        Ok(())
    } else {
        Err(PipelineError::MissingArtifact {
            stage: stage.name().to_string(),
            path: input.to_path_buf(),
        })
    }
}

/// Checks the stage input, creates the directory for its output and removes
/// any output left by an earlier run
///
/// The next stage's input check then only passes for a file this run wrote.
async fn prepare(stage: Stage, input: &Path, output: &Path) -> Result<()> {
    require(stage, input)?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| PipelineError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    remove_stale(output).await
}

async fn remove_stale(output: &Path) -> Result<()> {
    match fs::remove_file(output).await {
        Ok(()) => {
            debug!("Removed output of previous run: {}", output.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
