use std::thread;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::*;

use crate::core::perf_monitor::PerformanceMonitor;
use crate::ui::{colorize_percent, format_memory_details};

/// Print one sample.
///
/// CPU usage is a delta between two readings, so the first reading is taken
/// when the monitor is built and the second one interval later.
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = super::resolve_config(matches)?;
    let json_output = matches.get_flag("json");

    let monitor = PerformanceMonitor::new(&config).context("Failed to create performance monitor")?;
    thread::sleep(config.interval());
    let sample = monitor.current_sample();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&sample)?);
        return Ok(());
    }

    println!("{}", "Performance Snapshot".cyan().bold());
    println!();
    println!("  {:<8} {}", "CPU:".bold(), colorize_percent(sample.cpu_usage_percent));
    println!("  {:<8} {}", "Memory:".bold(), colorize_percent(sample.memory_usage_percent));
    if let Some(status) = monitor.memory_status() {
        println!("  {:<8} {}", "", format_memory_details(&status).dimmed());
    }
    match sample.gpu_usage_percent {
        Some(gpu) => println!("  {:<8} {}", "GPU:".bold(), colorize_percent(gpu)),
        None => println!("  {:<8} {}", "GPU:".bold(), "not available".dimmed()),
    }

    monitor.dispose();
    Ok(())
}
