//! OSM Router CLI application
//!
//! Command-line interface that keeps a national OpenStreetMap extract up to
//! date and turns it into a spatialite street routing database.

use std::process;

use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

use osm_router::cli::{
    handle_clean, handle_config, handle_download, handle_resolve, handle_run, Cli, Commands,
};
use osm_router::config::AppConfig;
use osm_router::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let flag_level = cli.log_level().map(|level| level.to_string());
    let show_levels = cli.global.very_verbose;

    // `config init` must work even when the existing file is broken
    if let Commands::Config(args) = cli.command {
        init_logging(flag_level.as_deref().unwrap_or("warn"), show_levels);
        return handle_config(args).await;
    }

    let config = AppConfig::load(cli.global.config.clone()).await?;
    init_logging(
        flag_level.as_deref().unwrap_or(&config.logging.level),
        show_levels,
    );

    info!("OSM Router v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Run(args) => {
            info!("Executing run command");
            handle_run(&cli.global, config, args).await
        }
        Commands::Download(args) => {
            info!("Executing download command");
            handle_download(&cli.global, config, args).await
        }
        Commands::Resolve => {
            info!("Executing resolve command");
            handle_resolve(config).await
        }
        Commands::Clean(args) => {
            info!("Executing clean command");
            handle_clean(config, args).await
        }
        Commands::Config(args) => handle_config(args).await,
    }
}

/// Initialize logging for the crate at `level`; `RUST_LOG` still applies
fn init_logging(level: &str, show_levels: bool) {
    let level: LevelFilter = level.parse().unwrap_or(LevelFilter::WARN);
    let filter = match format!("osm_router={}", level).parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env().add_directive(level.into()),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(show_levels)
        .init();
}
