//! Item Mapper - batch entry point.
//!
//! # Overview
//!
//! One invocation performs one complete mapping run:
//! - Load `ItemMapper.yaml` from the working directory (defaults when absent)
//! - Initialize logging (rotating file under `logs/` + console)
//! - Build a multi-thread tokio runtime
//! - Run the [`Pipeline`]: catalog wave, market wave, write phase
//! - Log the error summary and run metrics
//!
//! # Exit behavior
//!
//! The run is best effort. Dataset fetch and file write failures are logged and the
//! process still exits successfully with every dataset that succeeded written under
//! `mini/` and `pretty/`. Only startup failures (config, logging, runtime, output
//! directories) produce a non-zero exit.

use anyhow::{Context, Result};
use item_mapper::{APP_NAME, ConfigManager, Pipeline, VERSION};

fn main() -> Result<()> {
    let config = ConfigManager::new(".").load_config()?;

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = item_mapper::logging::setup_logging(&config.logging)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("item-mapper-worker")
        .build()
        .context("Failed to build tokio runtime")?;

    let pipeline = Pipeline::new(&config)?;
    let report = runtime.block_on(pipeline.run())?;

    if report.is_clean() {
        tracing::info!("All datasets fetched and written");
    } else {
        tracing::warn!("Run finished with {} errors:", report.errors.len());
        for err in &report.errors {
            tracing::warn!("  {}", err);
        }
    }

    pipeline.metrics().log_summary();
    Ok(())
}
