use std::io;
use thiserror::Error;

/// Custom error type for the performance sampler
#[derive(Error, Debug)]
pub enum PerfError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{call} failed with status 0x{status:08X}")]
    Native { call: &'static str, status: u32 },

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Not supported on this platform: {0}")]
    Unsupported(String),

    #[error("Metric collection failed: {0}")]
    MetricCollection(String),
}

/// Result type alias for the performance sampler
pub type Result<T> = std::result::Result<T, PerfError>;

impl PerfError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        PerfError::Config(msg.into())
    }

    /// Wrap a non-zero status returned by a native call
    pub fn native(call: &'static str, status: u32) -> Self {
        PerfError::Native { call, status }
    }

    pub fn registry<S: Into<String>>(msg: S) -> Self {
        PerfError::Registry(msg.into())
    }

    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        PerfError::Unsupported(msg.into())
    }

    pub fn metric_collection<S: Into<String>>(msg: S) -> Self {
        PerfError::MetricCollection(msg.into())
    }
}
