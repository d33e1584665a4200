use chrono::{DateTime, Local, Utc};
use colored::*;
use humansize::{format_size, BINARY};

use crate::core::perf_monitor::{MemoryStatus, Sample};

const WARNING_PERCENT: f64 = 75.0;
const CRITICAL_PERCENT: f64 = 90.0;

/// Format a usage percentage with no decimals ("42%")
pub fn format_percent(value: f64) -> String {
    format!("{:.0}%", value)
}

/// Color a usage percentage by threshold
pub fn colorize_percent(value: f64) -> ColoredString {
    let text = format_percent(value);
    if value >= CRITICAL_PERCENT {
        text.red().bold()
    } else if value >= WARNING_PERCENT {
        text.yellow()
    } else {
        text.green()
    }
}

/// Used and total physical memory, e.g. "Memory: 10 GiB / 16 GiB"
pub fn format_memory_details(status: &MemoryStatus) -> String {
    format!(
        "Memory: {} / {}",
        format_size(status.used_bytes(), BINARY),
        format_size(status.total_bytes, BINARY)
    )
}

/// Format a sample timestamp in local time (HH:MM:SS)
pub fn format_timestamp(timestamp: i64) -> String {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(utc) => utc.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

/// One-line colored summary: "12:00:01  CPU: 12%  RAM: 40%  GPU: --"
pub fn format_sample_line(sample: &Sample) -> String {
    let gpu = match sample.gpu_usage_percent {
        Some(value) => colorize_percent(value).to_string(),
        None => "--".dimmed().to_string(),
    };

    format!(
        "{}  {} {}  {} {}  {} {}",
        format_timestamp(sample.timestamp).dimmed(),
        "CPU:".bold(),
        colorize_percent(sample.cpu_usage_percent),
        "RAM:".bold(),
        colorize_percent(sample.memory_usage_percent),
        "GPU:".bold(),
        gpu
    )
}
