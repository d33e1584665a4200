use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PerfError, Result};

const MAX_SETTLE_DELAY_MS: u64 = 1000;

/// Sampling engine configuration.
///
/// Read from `<config_dir>/perfsill/config.json` when present. Missing fields
/// take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Scheduler tick interval
    pub interval_ms: u64,
    /// Collect GPU engine utilization at all
    pub gpu_enabled: bool,
    /// Gap between the two collections of one GPU reading
    pub gpu_settle_delay_ms: u64,
    /// Fall back to probing the GPU engine counter object when no dedicated
    /// adapter is found
    pub probe_gpu_counters: bool,
    /// Samples buffered per subscriber before it starts lagging
    pub channel_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            gpu_enabled: true,
            gpu_settle_delay_ms: 100,
            probe_gpu_counters: true,
            channel_capacity: 16,
        }
    }
}

impl MonitorConfig {
    /// Load from the default location, or defaults when no file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let config = MonitorConfig::default();
            config.validate()?;
            return Ok(config);
        }

        Self::from_path(&config_path)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            PerfError::config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        // An empty file means "all defaults"
        let config: MonitorConfig = if data.trim().is_empty() {
            MonitorConfig::default()
        } else {
            serde_json::from_str(&data)?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(PerfError::config("interval_ms must be greater than zero"));
        }

        if self.gpu_settle_delay_ms == 0 || self.gpu_settle_delay_ms > MAX_SETTLE_DELAY_MS {
            return Err(PerfError::config(format!(
                "gpu_settle_delay_ms must be between 1 and {}",
                MAX_SETTLE_DELAY_MS
            )));
        }

        if self.channel_capacity == 0 {
            return Err(PerfError::config("channel_capacity must be greater than zero"));
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn gpu_settle_delay(&self) -> Duration {
        Duration::from_millis(self.gpu_settle_delay_ms)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PerfError::config("Could not determine config directory"))?;

        Ok(config_dir.join("perfsill").join("config.json"))
    }
}
