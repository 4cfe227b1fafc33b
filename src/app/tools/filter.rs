//! Attribute filter wrapper (`osmfilter`)

use std::path::Path;

use super::executor::{ExternalTool, ToolRun};
use crate::constants::tools;
use crate::errors::ToolResult;

/// Keeps only objects carrying the primary road tag
#[derive(Debug, Clone)]
pub struct OsmFilter {
    tool: ExternalTool,
}

impl OsmFilter {
    pub fn new(tool: ExternalTool) -> Self {
        Self { tool }
    }

    pub fn tool(&self) -> &ExternalTool {
        &self.tool
    }

    /// `<input> --keep=highway= -o=<output>`
    pub fn arguments(&self, input: &Path, output: &Path) -> Vec<String> {
        vec![
            input.display().to_string(),
            tools::KEEP_HIGHWAY.to_string(),
            format!("-o={}", output.display()),
        ]
    }

    pub async fn run(&self, input: &Path, output: &Path) -> ToolResult<ToolRun> {
        let invocation = self.tool.run(&self.arguments(input, output)).await?;
        Ok(ToolRun {
            invocation,
            output: output.to_path_buf(),
        })
    }
}
