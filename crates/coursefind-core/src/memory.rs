use tracing::{debug, info};

/// Resident set size of this process in MB, if the platform reports it.
pub fn current_rss_mb() -> Option<f64> {
    memory_stats::memory_stats().map(|stats| stats.physical_mem as f64 / (1024.0 * 1024.0))
}

/// Log the current memory usage at INFO, tagged with the pipeline stage.
pub fn log_memory_usage(stage: &str) {
    match current_rss_mb() {
        Some(mb) => info!(stage, "Current memory usage: {mb:.2} MB"),
        None => debug!(stage, "memory usage unavailable on this platform"),
    }
}
