// Item Mapper - name-to-identifier lookup tables for CS2 items
//
// This is the library crate containing the fetch, extraction, and publication pipeline.
// The binary crate (main.rs) provides the batch entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::RunMetrics;
pub use models::{Category, Dataset, IdentifierMapping, IndexTable, KeyId, MapperConfig};
pub use pipeline::{Pipeline, PipelineError, RunReport};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
