//! GPU detection diagnostics.

use anyhow::Result;
use clap::ArgMatches;
use colored::*;

use crate::core::perf_monitor::gpu::{GpuAdapterClassifier, SessionStatus};
use crate::platform::system::{native_adapter_source, native_gpu_session};
use crate::ui::colorize_percent;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = super::resolve_config(matches)?;

    println!("{}", "GPU Detection".cyan().bold());
    println!();

    let classifier = GpuAdapterClassifier::new(native_adapter_source());
    match classifier.scan() {
        Ok(classification) if classification.has_dedicated_gpu => {
            let adapter = classification.adapter.unwrap_or_default();
            println!("  {:<18} {}", "Dedicated adapter:".bold(), adapter.green());
        }
        Ok(_) => println!("  {:<18} {}", "Dedicated adapter:".bold(), "none found".yellow()),
        Err(e) => println!("  {:<18} {}", "Dedicated adapter:".bold(), format!("scan failed ({})", e).red()),
    }

    let session = native_gpu_session(&config);
    let usage = session.get_usage();

    let status = match session.status() {
        SessionStatus::Ready { strategy, counters } => {
            format!("ready ({:?}, {} counter(s))", strategy, counters).green()
        }
        SessionStatus::Failed => "unavailable".red(),
        SessionStatus::Uninitialized => "not initialized".dimmed(),
    };
    println!("  {:<18} {}", "Counter session:".bold(), status);

    match usage {
        Some(value) => println!("  {:<18} {}", "Utilization:".bold(), colorize_percent(value)),
        None => println!("  {:<18} {}", "Utilization:".bold(), "--".dimmed()),
    }

    session.dispose();
    Ok(())
}
