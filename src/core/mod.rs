// Core sampling engine module

pub mod config;
pub mod perf_monitor;

// Re-export commonly used items
pub use config::MonitorConfig;
pub use perf_monitor::{PerformanceMonitor, Sample};
