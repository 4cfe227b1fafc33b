//! Format converter wrapper (`osmconvert`)
//!
//! Options are validated when the [`ConvertOptions`] value is built, so a
//! mistyped option never reaches the subprocess. A field left as `None` is
//! simply not passed to the tool.

use std::path::Path;

use toml::Value;

use super::executor::{ExternalTool, ToolRun};
use crate::errors::{ToolError, ToolResult};

/// Validated converter switches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub drop_author: Option<bool>,
    pub drop_version: Option<bool>,
    pub verbose: Option<bool>,
    pub complete_ways: Option<bool>,
    pub complete_multipolygons: Option<bool>,
    pub max_objects: Option<u64>,
    pub hash_memory: Option<u64>,
}

impl ConvertOptions {
    pub fn builder() -> ConvertOptionsBuilder {
        ConvertOptionsBuilder::default()
    }

    /// Builds options from a TOML table such as `[convert.to_intermediate]`
    ///
    /// Keys may use `_` or `-`.
    ///
    /// # Errors
    ///
    /// `ToolError::InvalidConfig` for a value of the wrong type and
    /// `ToolError::UnknownOption` for an unrecognised key.
    pub fn from_table(table: &toml::Table) -> ToolResult<Self> {
        table
            .iter()
            .try_fold(Self::builder(), |builder, (key, value)| builder.set(key, value))
            .map(ConvertOptionsBuilder::build)
    }

    /// Switches in the order the tool documents them
    pub fn to_args(&self) -> Vec<String> {
        let flags = [
            (self.drop_author, "--drop-author"),
            (self.drop_version, "--drop-version"),
            (self.verbose, "--verbose"),
            (self.complete_ways, "--complete-ways"),
            (self.complete_multipolygons, "--complete-multipolygons"),
        ];

        let mut args: Vec<String> = flags
            .iter()
            .filter(|(value, _)| *value == Some(true))
            .map(|(_, flag)| flag.to_string())
            .collect();

        if let Some(max_objects) = self.max_objects {
            args.push(format!("--max-objects={}", max_objects));
        }
        if let Some(hash_memory) = self.hash_memory {
            args.push(format!("--hash-memory={}", hash_memory));
        }
        args
    }
}

/// Builder for [`ConvertOptions`]
#[derive(Debug, Clone, Default)]
pub struct ConvertOptionsBuilder {
    options: ConvertOptions,
}

impl ConvertOptionsBuilder {
    pub fn drop_author(mut self, flag: bool) -> Self {
        self.options.drop_author = Some(flag);
        self
    }

    pub fn drop_version(mut self, flag: bool) -> Self {
        self.options.drop_version = Some(flag);
        self
    }

    pub fn verbose(mut self, flag: bool) -> Self {
        self.options.verbose = Some(flag);
        self
    }

    pub fn complete_ways(mut self, flag: bool) -> Self {
        self.options.complete_ways = Some(flag);
        self
    }

    pub fn complete_multipolygons(mut self, flag: bool) -> Self {
        self.options.complete_multipolygons = Some(flag);
        self
    }

    pub fn max_objects(mut self, objects: u64) -> Self {
        self.options.max_objects = Some(objects);
        self
    }

    pub fn hash_memory(mut self, megabytes: u64) -> Self {
        self.options.hash_memory = Some(megabytes);
        self
    }

    /// Sets an option by name from an untyped value
    pub fn set(self, name: &str, value: &Value) -> ToolResult<Self> {
        let key = name.replace('-', "_");
        let builder = match key.as_str() {
            "drop_author" => self.drop_author(expect_bool(name, value)?),
            "drop_version" => self.drop_version(expect_bool(name, value)?),
            "verbose" => self.verbose(expect_bool(name, value)?),
            "complete_ways" => self.complete_ways(expect_bool(name, value)?),
            "complete_multipolygons" => self.complete_multipolygons(expect_bool(name, value)?),
            "max_objects" => self.max_objects(expect_count(name, value)?),
            "hash_memory" => self.hash_memory(expect_count(name, value)?),
            _ => {
                return Err(ToolError::UnknownOption {
                    option: name.to_string(),
                })
            }
        };
        Ok(builder)
    }

    pub fn build(self) -> ConvertOptions {
        self.options
    }
}

fn expect_bool(name: &str, value: &Value) -> ToolResult<bool> {
    value.as_bool().ok_or_else(|| ToolError::InvalidConfig {
        option: name.to_string(),
        expected: "boolean",
        found: describe(value),
    })
}

fn expect_count(name: &str, value: &Value) -> ToolResult<u64> {
    value
        .as_integer()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| ToolError::InvalidConfig {
            option: name.to_string(),
            expected: "non-negative integer",
            found: describe(value),
        })
}

fn describe(value: &Value) -> String {
    format!("{} {}", value.type_str(), value)
}

/// Converts between the raw (`pbf`) and intermediate (`o5m`) formats
#[derive(Debug, Clone)]
pub struct OsmConvert {
    tool: ExternalTool,
    options: ConvertOptions,
}

impl OsmConvert {
    pub fn new(tool: ExternalTool, options: ConvertOptions) -> Self {
        Self { tool, options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn tool(&self) -> &ExternalTool {
        &self.tool
    }

    /// `<input> [switches] -o=<output>`; the output format follows the
    /// output file's extension
    pub fn arguments(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![input.display().to_string()];
        args.extend(self.options.to_args());
        args.push(format!("-o={}", output.display()));
        args
    }

    /// Converts `input` into `output`
    pub async fn run(&self, input: &Path, output: &Path) -> ToolResult<ToolRun> {
        let invocation = self.tool.run(&self.arguments(input, output)).await?;
        Ok(ToolRun {
            invocation,
            output: output.to_path_buf(),
        })
    }
}
