//! Delta-based CPU utilization from cumulative OS tick counters.

use crate::error::Result;

use super::sample::clamp_percent;

/// Cumulative idle/kernel/user time since boot, in OS ticks.
///
/// Kernel time includes idle time, as reported by the OS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub idle: u64,
    pub kernel: u64,
    pub user: u64,
}

/// Source of cumulative CPU tick counters.
pub trait TickSource: Send + Sync {
    fn read_ticks(&self) -> Result<CpuTicks>;
}

/// Stateful CPU usage calculator.
///
/// Every [`sample`](CpuSampler::sample) call measures the interval since the
/// previous call (or since the last [`reset`](CpuSampler::reset)).
pub struct CpuSampler {
    source: Box<dyn TickSource>,
    baseline: CpuTicks,
}

impl CpuSampler {
    /// Create a sampler and capture the initial baseline.
    pub fn new(source: Box<dyn TickSource>) -> Self {
        let mut sampler = Self {
            source,
            baseline: CpuTicks::default(),
        };
        sampler.reset();
        sampler
    }

    /// Re-capture the baseline from the current counters.
    pub fn reset(&mut self) {
        match self.source.read_ticks() {
            Ok(ticks) => self.baseline = ticks,
            Err(e) => log::debug!("Failed to capture CPU baseline: {}", e),
        }
    }

    /// Usage since the previous call, in `[0, 100]`. Read failures yield 0.
    pub fn sample(&mut self) -> f64 {
        let current = match self.source.read_ticks() {
            Ok(ticks) => ticks,
            Err(e) => {
                log::debug!("Failed to read CPU tick counters: {}", e);
                return 0.0;
            }
        };

        let usage = usage_between(&self.baseline, &current);
        self.baseline = current;
        usage
    }

    pub fn baseline(&self) -> CpuTicks {
        self.baseline
    }
}

/// Busy share of the interval between two tick readings.
///
/// Counters that went backwards contribute nothing instead of wrapping.
pub fn usage_between(previous: &CpuTicks, current: &CpuTicks) -> f64 {
    let idle_diff = current.idle.saturating_sub(previous.idle);
    let kernel_diff = current.kernel.saturating_sub(previous.kernel);
    let user_diff = current.user.saturating_sub(previous.user);

    let total_system = kernel_diff.saturating_add(user_diff);
    if total_system == 0 {
        return 0.0;
    }

    let busy = total_system.saturating_sub(idle_diff);
    clamp_percent(busy as f64 * 100.0 / total_system as f64)
}
