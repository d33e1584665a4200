// Perfsill Library - Public API

// Re-export error types
pub mod error;
pub use error::{PerfError, Result};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use crate::core::config::MonitorConfig;
pub use crate::core::perf_monitor::{Metric, PerformanceMonitor, Sample};

// Initialize logging
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
