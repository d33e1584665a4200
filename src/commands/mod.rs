// Command handlers module
pub mod gpu;
pub mod monitor;
pub mod snapshot;
pub mod version;

use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::config::MonitorConfig;

/// Resolve the monitor configuration from `--config` or the default location,
/// then apply the command-line overrides shared by the sampling commands.
pub fn resolve_config(matches: &ArgMatches) -> Result<MonitorConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => MonitorConfig::from_path(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => MonitorConfig::load().context("Failed to load config")?,
    };

    if let Ok(Some(&interval)) = matches.try_get_one::<u64>("interval") {
        config.interval_ms = interval;
    }

    if matches!(matches.try_get_one::<bool>("no-gpu"), Ok(Some(&true))) {
        config.gpu_enabled = false;
    }

    config.validate().context("Invalid monitor configuration")?;
    Ok(config)
}

// Re-exports for cleaner imports
pub use version::execute as version;
