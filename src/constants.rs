//! Application constants for OSM Router
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Remote data source defaults
pub mod source {
    /// Geofabrik index page listing the national extract
    pub const DEFAULT_PAGE_URL: &str = "https://download.geofabrik.de/south-america/brazil.html";

    /// Country whose extract is downloaded
    pub const DEFAULT_COUNTRY: &str = "brazil";

    /// CSS selector for candidate download anchors
    pub const ANCHOR_SELECTOR: &str = "a[href]";

    /// Change marker pattern (ISO-8601 UTC timestamp)
    pub const MARKER_PATTERN: &str = r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("OSM-Router/", env!("CARGO_PKG_VERSION"));

    /// Time budget for fetching the index page
    pub const PAGE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection establishment timeout, shared by page fetch and download
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// File system layout
pub mod paths {
    /// Root of all data directories
    pub const DATA_ROOT: &str = "data";

    /// Downloaded artifacts live under `<data>/<external>/<format>`
    pub const EXTERNAL_DIR: &str = "external";

    /// Stage outputs live under `<data>/<processed>/<format>`
    pub const PROCESSED_DIR: &str = "processed";

    /// Directory holding the finished spatial database
    pub const DATABASE_DIR: &str = "streets";

    /// Spatial database file name
    pub const DATABASE_FILE: &str = "streets.sqlite";

    /// Root of the bundled tool binaries
    pub const TOOL_ROOT: &str = "modules/osmtools/bin";

    /// Suffix appended to the artifact name for the change-marker sidecar
    pub const SIDECAR_SUFFIX: &str = "json";

    /// Suffix for in-flight downloads
    pub const TEMP_FILE_SUFFIX: &str = "part";

    /// Infix naming the filtered artifact
    pub const FILTERED_INFIX: &str = "filtered.streets";
}

/// External tool names and flag spellings
pub mod tools {
    /// Format converter
    pub const OSMCONVERT: &str = "osmconvert";

    /// Attribute filter
    pub const OSMFILTER: &str = "osmfilter";

    /// Directory grouping the spatial-database tools
    pub const SPATIALITE_FAMILY: &str = "spatialite";

    /// Network table loader
    pub const SPATIALITE_OSM_NET: &str = "spatialite_osm_net";

    /// Routing table builder
    pub const SPATIALITE_NETWORK: &str = "spatialite_network";

    /// File name marker of reduced-memory binary variants
    pub const MINIMAL_MARKER: &str = "minimal";

    /// Memory at or below which the reduced-memory tier is used (GB)
    pub const DEFAULT_LOW_MEMORY_THRESHOLD_GB: u64 = 4;

    /// Filter selector keeping the primary road tag
    pub const KEEP_HIGHWAY: &str = "--keep=highway=";
}

/// Routing network naming
pub mod network {
    /// Table holding the imported roads
    pub const ROADS_TABLE: &str = "roads";

    /// Routing table built from the roads table
    pub const ROUTER_TABLE: &str = "table_router_time";

    /// Virtual routing table exposed to queries
    pub const ROUTER_VIRTUAL_TABLE: &str = "router_time";

    pub const FROM_COLUMN: &str = "node_from";
    pub const TO_COLUMN: &str = "node_to";
    pub const GEOMETRY_COLUMN: &str = "geometry";
    pub const COST_COLUMN: &str = "cost";
    pub const NAME_COLUMN: &str = "name";
}

/// Configuration file discovery
pub mod config {
    /// Project-local configuration file
    pub const LOCAL_FILE: &str = "osm-router.toml";

    /// Per-user configuration directory name
    pub const APP_DIR: &str = "osm-router";

    /// Per-user configuration file name
    pub const USER_FILE: &str = "config.toml";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_version() {
        assert!(http::USER_AGENT.starts_with("OSM-Router/"));
        assert!(http::USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_marker_pattern_compiles() {
        let re = regex::Regex::new(source::MARKER_PATTERN).unwrap();
        assert!(re.is_match("2024-05-01T20:21:02Z"));
        assert!(!re.is_match("2024-05-01 20:21:02"));
    }
}
