//! OSM Router Library
//!
//! Keeps a national OpenStreetMap extract up to date and turns it into a
//! spatialite street routing database using bundled external tools.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
