//! External tool resolution and execution
//!
//! - `platform`: host facts (OS, word width, memory)
//! - `resolver`: choice of the bundled binary for those facts
//! - `executor`: subprocess launch with captured output
//! - `convert`, `filter`, `spatialite`: stage-specific argument building

pub mod convert;
pub mod executor;
pub mod filter;
pub mod platform;
pub mod resolver;
pub mod spatialite;

pub use convert::{ConvertOptions, ConvertOptionsBuilder, OsmConvert};
pub use executor::{CommandExecutor, ExternalTool, ToolInvocation, ToolRun};
pub use filter::OsmFilter;
pub use platform::{HostEnvironment, OperatingSystem};
pub use resolver::{BinaryDescriptor, BinaryResolver, MemoryTier, ToolSpec};
pub use spatialite::{NetworkLayout, SpatialiteTool};

use crate::constants::tools;

/// Format converter
pub const OSMCONVERT: ToolSpec = ToolSpec::new(tools::OSMCONVERT, tools::OSMCONVERT);

/// Attribute filter
pub const OSMFILTER: ToolSpec = ToolSpec::new(tools::OSMFILTER, tools::OSMFILTER);

/// Road network loader
pub const SPATIALITE_OSM_NET: ToolSpec =
    ToolSpec::new(tools::SPATIALITE_FAMILY, tools::SPATIALITE_OSM_NET);

/// Routing table builder
pub const SPATIALITE_NETWORK: ToolSpec =
    ToolSpec::new(tools::SPATIALITE_FAMILY, tools::SPATIALITE_NETWORK);

/// Every tool the pipeline needs, in stage order
pub const PIPELINE_TOOLS: [ToolSpec; 4] = [OSMCONVERT, OSMFILTER, SPATIALITE_OSM_NET, SPATIALITE_NETWORK];
