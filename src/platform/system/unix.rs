//! Native sources for non-Windows targets.
//!
//! CPU ticks come from `/proc/stat` and memory from `sysinfo`. There is no
//! display adapter registry or PDH subsystem here, so the GPU seams report
//! `Unsupported` and the GPU metric stays absent.

use std::fs;

use parking_lot::Mutex;
use sysinfo::System;

use crate::core::perf_monitor::gpu::{
    AdapterSource, AdapterStrings, ArrayRead, CounterBackend, CounterReading,
};
use crate::core::perf_monitor::{CpuTicks, MemorySource, MemoryStatus, TickSource};
use crate::error::{PerfError, Result};

const PROC_STAT: &str = "/proc/stat";

/// Aggregate `cpu` line of `/proc/stat`.
pub struct ProcStatSource;

impl TickSource for ProcStatSource {
    fn read_ticks(&self) -> Result<CpuTicks> {
        let contents = fs::read_to_string(PROC_STAT)?;
        parse_proc_stat(&contents)
    }
}

/// Fold the aggregate `cpu` line into idle/kernel/user, with kernel time
/// including idle time.
pub fn parse_proc_stat(contents: &str) -> Result<CpuTicks> {
    let line = contents
        .lines()
        .find(|line| line.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| PerfError::metric_collection("no aggregate cpu line in /proc/stat"))?;

    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|field| field.parse::<u64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| PerfError::metric_collection(format!("malformed /proc/stat: {}", e)))?;

    if fields.len() < 4 {
        return Err(PerfError::metric_collection(
            "too few fields on /proc/stat cpu line",
        ));
    }

    let field = |index: usize| fields.get(index).copied().unwrap_or(0);
    let (user, nice, system, idle) = (field(0), field(1), field(2), field(3));
    let (iowait, irq, softirq, steal) = (field(4), field(5), field(6), field(7));

    let idle_total = idle + iowait;
    Ok(CpuTicks {
        idle: idle_total,
        kernel: system + irq + softirq + steal + idle_total,
        user: user + nice,
    })
}

/// Memory snapshot through `sysinfo`.
pub struct SysinfoMemorySource {
    system: Mutex<System>,
}

impl SysinfoMemorySource {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource for SysinfoMemorySource {
    fn read_status(&self) -> Result<MemoryStatus> {
        let mut system = self.system.lock();
        system.refresh_memory();

        let total = system.total_memory();
        if total == 0 {
            return Err(PerfError::metric_collection("total memory reported as zero"));
        }

        let available = system.available_memory();
        let used = total.saturating_sub(available);

        Ok(MemoryStatus {
            load_percent: used as f64 * 100.0 / total as f64,
            total_bytes: total,
            available_bytes: available,
        })
    }
}

pub struct UnsupportedAdapterSource;

impl AdapterSource for UnsupportedAdapterSource {
    fn subkey_names(&self) -> Result<Vec<String>> {
        Err(PerfError::unsupported("display adapter registry"))
    }

    fn adapter_strings(&self, _subkey: &str) -> Result<AdapterStrings> {
        Err(PerfError::unsupported("display adapter registry"))
    }
}

/// Counter backend for targets without PDH. Every call fails.
pub struct UnsupportedCounterBackend;

impl CounterBackend for UnsupportedCounterBackend {
    type Query = ();
    type Counter = ();

    fn open_query(&mut self) -> Result<()> {
        Err(PerfError::unsupported("performance counter queries"))
    }

    fn close_query(&mut self, _query: ()) {}

    fn add_counter(&mut self, _query: &(), _path: &str) -> Result<()> {
        Err(PerfError::unsupported("performance counters"))
    }

    fn collect(&mut self, _query: &()) -> Result<()> {
        Err(PerfError::unsupported("performance counters"))
    }

    fn read_array(&mut self, _counter: &()) -> Result<ArrayRead> {
        Err(PerfError::unsupported("performance counters"))
    }

    fn read_scalar(&mut self, _counter: &()) -> Result<CounterReading> {
        Err(PerfError::unsupported("performance counters"))
    }

    fn enumerate_instances(&mut self, _object: &str) -> Result<Vec<String>> {
        Err(PerfError::unsupported("performance objects"))
    }

    fn object_has_instances(&mut self, _object: &str) -> bool {
        false
    }
}
