// Run metrics module
//
// Lightweight counters for one pipeline run, logged as a summary at the end

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters for one run
///
/// Uses atomic operations so fan-out tasks can record without locks.
#[derive(Debug)]
pub struct RunMetrics {
    /// Datasets fetched and extracted successfully
    pub datasets_fetched: AtomicUsize,

    /// Datasets that failed to fetch, decode, or whose task aborted
    pub datasets_failed: AtomicUsize,

    /// Output files written (each dataset produces two)
    pub files_written: AtomicUsize,

    /// Output files that could not be written
    pub files_failed: AtomicUsize,

    /// Run start time
    start_time: Instant,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            datasets_fetched: AtomicUsize::new(0),
            datasets_failed: AtomicUsize::new(0),
            files_written: AtomicUsize::new(0),
            files_failed: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_dataset_fetched(&self) {
        self.datasets_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dataset_failed(&self) {
        self.datasets_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_written(&self) {
        self.files_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Run Summary ===");
        tracing::info!("Elapsed: {:.2}s", self.elapsed().as_secs_f64());
        tracing::info!(
            "Datasets: {} fetched, {} failed",
            self.datasets_fetched.load(Ordering::Relaxed),
            self.datasets_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Files: {} written, {} failed",
            self.files_written.load(Ordering::Relaxed),
            self.files_failed.load(Ordering::Relaxed)
        );
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}
