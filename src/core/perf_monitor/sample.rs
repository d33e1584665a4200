use serde::{Deserialize, Serialize};

/// One utilization reading produced per scheduler tick.
///
/// All percentages are in `[0, 100]`. `gpu_usage_percent` is `None` when no
/// dedicated GPU was detected or the GPU counter session could not be built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: i64, // Unix timestamp
    pub cpu_usage_percent: f64,
    pub memory_usage_percent: f64,
    pub gpu_usage_percent: Option<f64>,
}

/// Metric selector used by hosts that drive a single indicator from a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    #[default]
    Cpu,
    Gpu,
    Memory,
}

const MIN_ANIMATION_SPEED: f64 = 0.1;
const MAX_ANIMATION_SPEED: f64 = 3.0;

impl Sample {
    pub fn new(cpu: f64, memory: f64, gpu: Option<f64>) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp(),
            cpu_usage_percent: clamp_percent(cpu),
            memory_usage_percent: clamp_percent(memory),
            gpu_usage_percent: gpu.map(clamp_percent),
        }
    }

    /// Value of the selected metric, `None` only for an absent GPU reading.
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Cpu => Some(self.cpu_usage_percent),
            Metric::Gpu => self.gpu_usage_percent,
            Metric::Memory => Some(self.memory_usage_percent),
        }
    }

    /// Map the selected metric linearly onto a 0.1x..3.0x speed factor.
    ///
    /// An absent GPU reading counts as idle.
    pub fn animation_speed(&self, metric: Metric) -> f64 {
        let value = self.metric(metric).unwrap_or(0.0);
        let speed = value / 100.0 * (MAX_ANIMATION_SPEED - MIN_ANIMATION_SPEED) + MIN_ANIMATION_SPEED;
        speed.clamp(MIN_ANIMATION_SPEED, MAX_ANIMATION_SPEED)
    }
}

/// Clamp a percentage into `[0, 100]`; NaN reads as 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
