use crate::error::Result;

use super::sample::clamp_percent;

/// Physical memory snapshot as reported by the OS.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryStatus {
    pub load_percent: f64,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl MemoryStatus {
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }
}

/// Source of a single memory status query.
pub trait MemorySource: Send + Sync {
    fn read_status(&self) -> Result<MemoryStatus>;
}

/// Stateless memory load reader.
pub struct MemorySampler {
    source: Box<dyn MemorySource>,
}

impl MemorySampler {
    pub fn new(source: Box<dyn MemorySource>) -> Self {
        Self { source }
    }

    /// Current memory load in `[0, 100]`. Failures yield 0.
    pub fn sample(&self) -> f64 {
        self.status()
            .map(|status| clamp_percent(status.load_percent))
            .unwrap_or(0.0)
    }

    pub fn status(&self) -> Option<MemoryStatus> {
        match self.source.read_status() {
            Ok(status) => Some(status),
            Err(e) => {
                log::debug!("Failed to query memory status: {}", e);
                None
            }
        }
    }
}
