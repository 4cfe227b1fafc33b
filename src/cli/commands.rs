//! Command handlers for OSM Router CLI
//!
//! This module implements the command handlers that connect CLI arguments to
//! the core application functionality.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info, warn};

use crate::app::tools::PIPELINE_TOOLS;
use crate::app::{
    AcquisitionOutcome, BinaryResolver, GeofabrikClient, HostEnvironment, Pipeline,
    PipelineTools, ProtobufDownloader,
};
use crate::cli::{CleanArgs, ConfigAction, ConfigArgs, GlobalArgs, SourceArgs};
use crate::config::AppConfig;
use crate::errors::{ConfigError, Result};

/// Handle the run command
///
/// Runs every stage from acquisition to the routing table and prints the
/// database location.
pub async fn handle_run(global: &GlobalArgs, config: AppConfig, args: SourceArgs) -> Result<()> {
    let start_time = Instant::now();
    let config = apply_overrides(config, &args)?;
    let (to_intermediate, to_raw) = config.convert.to_options()?;

    // Resolve every binary before touching the network
    let resolver = resolver_for(&config);
    let tools = PipelineTools::resolve(&resolver, to_intermediate, to_raw)?;

    let client = GeofabrikClient::with_config(config.client.to_runtime_config(!global.quiet))?;
    let pipeline = Pipeline::new(
        client,
        config.page_url()?,
        config.pipeline_layout(),
        tools,
    )?;

    let report = pipeline.run().await.map_err(|e| {
        error!("Pipeline failed ({}): {}", e.category(), e);
        e
    })?;

    if !global.quiet {
        match &report.acquisition.outcome {
            AcquisitionOutcome::Unchanged => println!(
                "Extract unchanged since {}",
                report.acquisition.change_marker
            ),
            AcquisitionOutcome::Downloaded { dataset, bytes } => println!(
                "Downloaded {} ({} bytes, {})",
                dataset.url, bytes, dataset.change_marker
            ),
        }
        for (stage, invocation) in &report.invocations {
            println!("  {:<24} {:>8} ms", stage.name(), invocation.duration_ms());
        }
        println!(
            "Routing database: {} ({:.1}s)",
            report.database_path().display(),
            start_time.elapsed().as_secs_f64()
        );
    }
    Ok(())
}

/// Handle the download command
pub async fn handle_download(
    global: &GlobalArgs,
    config: AppConfig,
    args: SourceArgs,
) -> Result<()> {
    let config = apply_overrides(config, &args)?;
    let client = GeofabrikClient::with_config(config.client.to_runtime_config(!global.quiet))?;

    let downloader = ProtobufDownloader::new(
        client,
        config.page_url()?,
        config.source.country.clone(),
        config.pipeline_layout().download(),
    )?;
    let acquisition = downloader.run().await?;

    if !global.quiet {
        let status = if acquisition.was_downloaded() {
            "downloaded"
        } else {
            "unchanged"
        };
        println!(
            "{} ({}, marker {})",
            acquisition.artifact.path.display(),
            status,
            acquisition.change_marker
        );
    }
    Ok(())
}

/// Handle the resolve command
///
/// Prints the decision for every tool. Fails with the first resolution
/// error so the exit code reflects an incomplete installation.
pub async fn handle_resolve(config: AppConfig) -> Result<()> {
    let resolver = resolver_for(&config);
    let host = resolver.host();

    println!("Host");
    println!("  Operating system: {}", host.operating_system);
    println!("  Architecture:     {} bits", host.architecture_bits);
    println!(
        "  Memory:           {} GB (low-memory threshold {} GB)",
        host.total_memory_gb, config.tools.low_memory_threshold_gb
    );
    println!();
    println!("Tools");

    let mut first_error = None;
    for tool in PIPELINE_TOOLS {
        match resolver.resolve(&tool) {
            Ok(binary) => println!("  {:<20} {}", tool.name, binary.path.display()),
            Err(e) => {
                println!(
                    "  {:<20} MISSING in {}",
                    tool.name,
                    resolver.tier(&tool).directory.display()
                );
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Handle the clean command
///
/// Without `--confirm` the directories are only listed.
pub async fn handle_clean(config: AppConfig, args: CleanArgs) -> Result<()> {
    let layout = config.pipeline_layout();
    let mut directories = Vec::new();
    for root in [layout.external_root(), layout.processed_root()] {
        directories.extend(list_directories(&root).await?);
    }

    if directories.is_empty() {
        println!("Nothing to clean");
        return Ok(());
    }

    for directory in &directories {
        if args.confirm {
            tokio::fs::remove_dir_all(directory).await?;
            info!("Removed {}", directory.display());
            println!("Removed {}", directory.display());
        } else {
            println!("{}", directory.display());
        }
    }

    if !args.confirm {
        println!();
        println!("Run again with --confirm to delete these directories");
    }
    Ok(())
}

/// Handle configuration management
pub async fn handle_config(args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Init { path } => {
            let (path, written) = AppConfig::initialize(path).await?;
            if written {
                println!("Created default configuration file:");
                println!("   {}", path.display());
            } else {
                warn!("Configuration file already exists: {}", path.display());
                println!("Configuration file already exists: {}", path.display());
            }
            Ok(())
        }
    }
}

fn resolver_for(config: &AppConfig) -> BinaryResolver {
    BinaryResolver::new(
        &config.paths.tool_root,
        HostEnvironment::detect(),
        config.tools.low_memory_threshold_gb,
    )
}

/// Applies `--country` and `--url` on top of the loaded configuration
fn apply_overrides(mut config: AppConfig, args: &SourceArgs) -> Result<AppConfig> {
    args.validate().map_err(|reason| ConfigError::InvalidValue {
        field: "command line".to_string(),
        value: format!("{:?}", args),
        reason,
    })?;

    if let Some(country) = &args.country {
        config.source.country = country.clone();
    }
    if let Some(url) = &args.url {
        config.source.page_url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Immediate subdirectories of `root`, sorted; a missing root has none
async fn list_directories(root: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut directories = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            directories.push(entry.path());
        }
    }
    directories.sort();
    Ok(directories)
}
