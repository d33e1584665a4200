//! Live sampling until Ctrl+C or `--count` samples.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::*;
use tokio::sync::broadcast::error::TryRecvError;

use crate::core::perf_monitor::PerformanceMonitor;
use crate::ui::format_sample_line;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = super::resolve_config(matches)?;
    let count = matches.get_one::<u64>("count").copied();
    let json_output = matches.get_flag("json");

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();

    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::Relaxed);
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    let monitor = PerformanceMonitor::new(&config).context("Failed to create performance monitor")?;
    let mut samples = monitor.subscribe();

    if !json_output {
        println!(
            "{}",
            format!("Sampling every {} ms", config.interval_ms).cyan().bold()
        );
        println!("{}", "Press Ctrl+C to stop".dimmed());
        println!();
    }

    monitor.start();

    let mut received: u64 = 0;
    while !stop_flag.load(Ordering::Relaxed) {
        match samples.try_recv() {
            Ok(sample) => {
                if json_output {
                    println!("{}", serde_json::to_string(&sample)?);
                } else {
                    println!("{}", format_sample_line(&sample));
                }

                received += 1;
                if count.is_some_and(|limit| received >= limit) {
                    break;
                }
            }
            Err(TryRecvError::Empty) => thread::sleep(POLL_INTERVAL),
            Err(TryRecvError::Lagged(skipped)) => {
                log::warn!("Output fell behind, skipped {} sample(s)", skipped);
            }
            Err(TryRecvError::Closed) => break,
        }
    }

    monitor.dispose();

    if !json_output {
        println!();
        println!("{}", format!("Collected {} sample(s)", received).dimmed());
    }

    Ok(())
}
