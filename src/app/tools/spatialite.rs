//! Spatial-database tool wrappers (`spatialite_*`)
//!
//! These tools expose a wide surface and are used narrowly, so they take
//! caller-supplied argument lists instead of a typed configuration. The
//! helpers below build the two lists the pipeline needs.

use std::path::Path;

use super::executor::{ExternalTool, ToolInvocation};
use crate::constants::network;
use crate::errors::ToolResult;

/// Any tool of the spatialite family
#[derive(Debug, Clone)]
pub struct SpatialiteTool {
    tool: ExternalTool,
}

impl SpatialiteTool {
    pub fn new(tool: ExternalTool) -> Self {
        Self { tool }
    }

    pub fn tool(&self) -> &ExternalTool {
        &self.tool
    }

    /// Passes `arguments` through unchanged
    pub async fn run(&self, arguments: &[String]) -> ToolResult<ToolInvocation> {
        self.tool.run(arguments).await
    }
}

/// `spatialite_osm_net`: loads the road network of an OSM file into `table`
pub fn osm_net_arguments(osm_path: &Path, table: &str, database: &Path) -> Vec<String> {
    vec![
        "-o".to_string(),
        osm_path.display().to_string(),
        "-T".to_string(),
        table.to_string(),
        "-d".to_string(),
        database.display().to_string(),
    ]
}

/// Column and table names for `spatialite_network`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkLayout {
    pub table: String,
    pub from_column: String,
    pub to_column: String,
    pub geometry_column: String,
    pub cost_column: String,
    pub name_column: String,
    pub output_table: String,
    pub virtual_table: String,
    pub a_star: bool,
    pub overwrite: bool,
}

impl Default for NetworkLayout {
    fn default() -> Self {
        Self {
            table: network::ROADS_TABLE.to_string(),
            from_column: network::FROM_COLUMN.to_string(),
            to_column: network::TO_COLUMN.to_string(),
            geometry_column: network::GEOMETRY_COLUMN.to_string(),
            cost_column: network::COST_COLUMN.to_string(),
            name_column: network::NAME_COLUMN.to_string(),
            output_table: network::ROUTER_TABLE.to_string(),
            virtual_table: network::ROUTER_VIRTUAL_TABLE.to_string(),
            a_star: true,
            overwrite: true,
        }
    }
}

/// `spatialite_network`: builds the routing table inside `database`
pub fn network_arguments(database: &Path, layout: &NetworkLayout) -> Vec<String> {
    let mut args: Vec<String> = [
        ("-d", database.display().to_string()),
        ("-T", layout.table.clone()),
        ("-f", layout.from_column.clone()),
        ("-t", layout.to_column.clone()),
        ("-g", layout.geometry_column.clone()),
        ("-c", layout.cost_column.clone()),
    ]
    .into_iter()
    .flat_map(|(flag, value)| [flag.to_string(), value])
    .collect();

    if layout.a_star {
        args.push("--a-star-supported".to_string());
    }
    args.extend([
        "-n".to_string(),
        layout.name_column.clone(),
        "-o".to_string(),
        layout.output_table.clone(),
        "-vt".to_string(),
        layout.virtual_table.clone(),
    ]);
    if layout.overwrite {
        args.push("--overwrite-output".to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osm_net_arguments() {
        let args = osm_net_arguments(
            Path::new("data/processed/pbf/brazil-latest.osm.filtered.streets.pbf"),
            "roads",
            Path::new("data/processed/streets/streets.sqlite"),
        );
        assert_eq!(
            args,
            vec![
                "-o",
                "data/processed/pbf/brazil-latest.osm.filtered.streets.pbf",
                "-T",
                "roads",
                "-d",
                "data/processed/streets/streets.sqlite",
            ]
        );
    }

    #[test]
    fn test_network_arguments_default_layout() {
        let args = network_arguments(
            Path::new("streets.sqlite"),
            &NetworkLayout::default(),
        );
        assert_eq!(
            args.join(" "),
            "-d streets.sqlite -T roads -f node_from -t node_to -g geometry -c cost \
             --a-star-supported -n name -o table_router_time -vt router_time --overwrite-output"
        );
    }

    #[test]
    fn test_network_arguments_without_switches() {
        let layout = NetworkLayout {
            a_star: false,
            overwrite: false,
            ..Default::default()
        };
        let args = network_arguments(Path::new("db.sqlite"), &layout);
        assert!(!args.contains(&"--a-star-supported".to_string()));
        assert!(!args.contains(&"--overwrite-output".to_string()));
    }
}
