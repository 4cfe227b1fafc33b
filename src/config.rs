//! Configuration management for OSM Router
//!
//! Settings come from a single TOML file, searched for in this order:
//!
//! 1. the path given with `--config`
//! 2. `./osm-router.toml`
//! 3. `<user config dir>/osm-router/config.toml`
//!
//! With no file every setting takes its default. Converter options are kept
//! as free-form tables in the file and validated into [`ConvertOptions`]
//! when the configuration is loaded, so a mistyped value is reported before
//! any tool runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use toml::Value;
use tracing::{debug, info};
use url::Url;

use crate::app::tools::ConvertOptions;
use crate::app::{ClientConfig, PipelineLayout};
use crate::constants::{config as files, http, paths, source, tools};
use crate::errors::{ConfigError, ConfigResult, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Remote extract settings
    pub source: SourceConfig,
    /// Data and tool directories
    pub paths: PathsConfig,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Binary selection settings
    pub tools: ToolsConfig,
    /// Converter options per conversion stage
    pub convert: ConvertConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Where the extract is published
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Index page listing the extract and its change marker
    pub page_url: String,
    /// Country whose extract is downloaded
    pub country: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            page_url: source::DEFAULT_PAGE_URL.to_string(),
            country: source::DEFAULT_COUNTRY.to_string(),
        }
    }
}

/// Directory layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_root: PathBuf,
    pub external_dir: String,
    pub processed_dir: String,
    /// Root of the `<OS>/<family>/<bits>bits` binary tree
    pub tool_root: PathBuf,
    pub database_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(paths::DATA_ROOT),
            external_dir: paths::EXTERNAL_DIR.to_string(),
            processed_dir: paths::PROCESSED_DIR.to_string(),
            tool_root: PathBuf::from(paths::TOOL_ROOT),
            database_file: paths::DATABASE_FILE.to_string(),
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Whole-request budget for the index page, e.g. "10s"
    #[serde(with = "humantime_serde")]
    pub page_timeout: Duration,
    /// Connection budget for every request
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            page_timeout: http::PAGE_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self, show_progress: bool) -> ClientConfig {
        ClientConfig {
            page_timeout: self.page_timeout,
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent.clone(),
            show_progress,
        }
    }
}

/// Binary selection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Hosts with this much memory or less use the reduced-memory builds
    pub low_memory_threshold_gb: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            low_memory_threshold_gb: tools::DEFAULT_LOW_MEMORY_THRESHOLD_GB,
        }
    }
}

/// Raw converter option tables
///
/// A table given in the file replaces the default table as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Options for `pbf -> o5m`
    pub to_intermediate: toml::Table,
    /// Options for `o5m -> pbf`
    pub to_raw: toml::Table,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            to_intermediate: convert_table(true),
            to_raw: convert_table(false),
        }
    }
}

const CONVERT_FLAGS: [&str; 5] = [
    "drop_author",
    "drop_version",
    "verbose",
    "complete_ways",
    "complete_multipolygons",
];
const DEFAULT_MAX_OBJECTS: i64 = 500_000_000;
const DEFAULT_HASH_MEMORY: i64 = 4096;

fn convert_table(flags: bool) -> toml::Table {
    let mut table: toml::Table = CONVERT_FLAGS
        .iter()
        .map(|flag| (flag.to_string(), Value::Boolean(flags)))
        .collect();
    table.insert("max_objects".to_string(), Value::Integer(DEFAULT_MAX_OBJECTS));
    table.insert("hash_memory".to_string(), Value::Integer(DEFAULT_HASH_MEMORY));
    table
}

impl ConvertConfig {
    /// Validated options for both conversion stages
    ///
    /// # Errors
    ///
    /// `ToolError::InvalidConfig` or `ToolError::UnknownOption` for the first
    /// bad entry
    pub fn to_options(&self) -> Result<(ConvertOptions, ConvertOptions)> {
        Ok((
            ConvertOptions::from_table(&self.to_intermediate)?,
            ConvertOptions::from_table(&self.to_raw)?,
        ))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level used when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration, falling back to defaults when no file exists
    ///
    /// # Errors
    ///
    /// `ConfigError::NotFound` when an explicit file is missing, a parse or
    /// value error for a malformed file, and a tool error for invalid
    /// converter options.
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) if path.exists() => Some(path),
            Some(path) => return Err(ConfigError::NotFound { path }.into()),
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks every value that is only interpreted later
    pub fn validate(&self) -> Result<()> {
        self.page_url()?;
        if self.source.country.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "source.country".to_string(),
                value: self.source.country.clone(),
                reason: "Country must not be empty".to_string(),
            }
            .into());
        }
        self.convert.to_options()?;
        Ok(())
    }

    /// Parsed index page URL
    pub fn page_url(&self) -> ConfigResult<Url> {
        Url::parse(&self.source.page_url).map_err(|e| ConfigError::InvalidValue {
            field: "source.page_url".to_string(),
            value: self.source.page_url.clone(),
            reason: e.to_string(),
        })
    }

    /// Stage paths for the configured country
    pub fn pipeline_layout(&self) -> PipelineLayout {
        PipelineLayout {
            data_root: self.paths.data_root.clone(),
            external_dir: self.paths.external_dir.clone(),
            processed_dir: self.paths.processed_dir.clone(),
            database_file: self.paths.database_file.clone(),
            country: self.source.country.clone(),
        }
    }

    /// Writes a commented default file to `path`, or to the per-user location
    ///
    /// Returns the path and whether a file was written; an existing file is
    /// left untouched.
    pub async fn initialize(path: Option<PathBuf>) -> Result<(PathBuf, bool)> {
        let config_path = match path {
            Some(path) => path,
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            debug!("Config file already exists: {}", config_path.display());
            return Ok((config_path, false));
        }

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: config_path.clone(),
                source,
            })?;

        info!("Created default configuration at {}", config_path.display());
        Ok((config_path, true))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(files::LOCAL_FILE)];
        if let Ok(user) = Self::default_config_path() {
            search_paths.push(user);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        if let Some(path) = &found {
            debug!("Found config file: {}", path.display());
        }
        found
    }

    /// Per-user config file path
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(files::APP_DIR).join(files::USER_FILE))
    }

    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Default configuration content with explanatory comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# OSM Router Configuration
# Every setting below is the built-in default; remove what you do not change.

[source]
# Index page listing the extract and its last-modified timestamp
page_url = "{page_url}"
country = "{country}"

[paths]
data_root = "{data_root}"
external_dir = "{external_dir}"
processed_dir = "{processed_dir}"
# Bundled binaries: <tool_root>/<OS>/<family>/<bits>bits/<tool>*
tool_root = "{tool_root}"
database_file = "{database_file}"

[client]
page_timeout = "{page_timeout}"
connect_timeout = "{connect_timeout}"
# user_agent = "{user_agent}"

[tools]
# Hosts with this much RAM or less use 32-bit minimal builds
low_memory_threshold_gb = {threshold}

# Converter options: booleans are passed only when true,
# numbers only when present.
[convert.to_intermediate]
drop_author = true
drop_version = true
verbose = true
complete_ways = true
complete_multipolygons = true
max_objects = {max_objects}
hash_memory = {hash_memory}

[convert.to_raw]
drop_author = false
drop_version = false
verbose = false
complete_ways = false
complete_multipolygons = false
max_objects = {max_objects}
hash_memory = {hash_memory}

[logging]
level = "warn"  # error, warn, info, debug, trace
"#,
            page_url = source::DEFAULT_PAGE_URL,
            country = source::DEFAULT_COUNTRY,
            data_root = paths::DATA_ROOT,
            external_dir = paths::EXTERNAL_DIR,
            processed_dir = paths::PROCESSED_DIR,
            tool_root = paths::TOOL_ROOT,
            database_file = paths::DATABASE_FILE,
            page_timeout = format!("{}s", http::PAGE_TIMEOUT.as_secs()),
            connect_timeout = format!("{}s", http::CONNECT_TIMEOUT.as_secs()),
            user_agent = http::USER_AGENT,
            threshold = tools::DEFAULT_LOW_MEMORY_THRESHOLD_GB,
            max_objects = DEFAULT_MAX_OBJECTS,
            hash_memory = DEFAULT_HASH_MEMORY,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, ToolError};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.source.country, "brazil");
        assert_eq!(config.client.page_timeout, Duration::from_secs(10));
        assert_eq!(config.tools.low_memory_threshold_gb, 4);
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_convert_options() {
        let (to_intermediate, to_raw) = AppConfig::default().convert.to_options().unwrap();

        assert_eq!(
            to_intermediate.to_args(),
            vec![
                "--drop-author",
                "--drop-version",
                "--verbose",
                "--complete-ways",
                "--complete-multipolygons",
                "--max-objects=500000000",
                "--hash-memory=4096",
            ]
        );
        assert_eq!(
            to_raw.to_args(),
            vec!["--max-objects=500000000", "--hash-memory=4096"]
        );
    }

    #[test]
    fn test_config_file_generation() {
        let content = AppConfig::generate_default_config_content();
        let parsed: AppConfig = toml::from_str(&content).unwrap();

        assert!(content.contains("# OSM Router Configuration"));
        assert_eq!(parsed.source.page_url, source::DEFAULT_PAGE_URL);
        assert_eq!(parsed.client.connect_timeout, Duration::from_secs(10));
        assert_eq!(
            parsed.convert.to_options().unwrap(),
            AppConfig::default().convert.to_options().unwrap()
        );
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("osm-router.toml");
        tokio::fs::write(
            &config_path,
            r#"
[source]
country = "chile"
page_url = "https://download.geofabrik.de/south-america/chile.html"

[client]
page_timeout = "30s"

[convert.to_raw]
verbose = true
"#,
        )
        .await
        .unwrap();

        let config = AppConfig::load(Some(config_path)).await.unwrap();

        assert_eq!(config.source.country, "chile");
        assert_eq!(config.client.page_timeout, Duration::from_secs(30));
        assert_eq!(config.client.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.paths.tool_root, PathBuf::from(paths::TOOL_ROOT));

        let (_, to_raw) = config.convert.to_options().unwrap();
        assert_eq!(to_raw.to_args(), vec!["--verbose"]);
        assert_eq!(
            config.pipeline_layout().download(),
            PathBuf::from("data/external/pbf/chile-latest.osm.pbf")
        );
    }

    #[tokio::test]
    async fn test_mistyped_convert_option_rejected_at_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("osm-router.toml");
        tokio::fs::write(
            &config_path,
            "[convert.to_intermediate]\ndrop_author = \"yes\"\n",
        )
        .await
        .unwrap();

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(
            result,
            Err(AppError::Tool(ToolError::InvalidConfig { .. }))
        ));
    }

    #[tokio::test]
    async fn test_invalid_page_url_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("osm-router.toml");
        tokio::fs::write(&config_path, "[source]\npage_url = \"not a url\"\n")
            .await
            .unwrap();

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[tokio::test]
    async fn test_initialize_writes_once() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested/config.toml");

        let (path, written) = AppConfig::initialize(Some(config_path.clone())).await.unwrap();
        assert_eq!(path, config_path);
        assert!(written);

        std::fs::write(&config_path, "[source]\ncountry = \"peru\"\n").unwrap();
        let (_, written) = AppConfig::initialize(Some(config_path.clone())).await.unwrap();
        assert!(!written);
        assert!(std::fs::read_to_string(&config_path).unwrap().contains("peru"));
    }
}
