//! Composition root: samplers, GPU session and scheduler behind one handle.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::cpu::{CpuSampler, TickSource};
use super::gpu::{GpuUsageSource, SessionStatus};
use super::memory::{MemorySampler, MemorySource, MemoryStatus};
use super::sample::Sample;
use super::scheduler::{SampleSource, SamplingScheduler};
use crate::core::config::MonitorConfig;
use crate::error::Result;

/// OS-facing inputs of a [`PerformanceMonitor`].
pub struct SamplerSources {
    pub ticks: Box<dyn TickSource>,
    pub memory: Box<dyn MemorySource>,
    /// `None` disables the GPU metric entirely.
    pub gpu: Option<Box<dyn GpuUsageSource>>,
}

/// The three samplers composed into one [`Sample`] per call.
pub struct Samplers {
    cpu: Mutex<CpuSampler>,
    memory: MemorySampler,
    gpu: Option<Box<dyn GpuUsageSource>>,
}

impl Samplers {
    pub fn new(sources: SamplerSources) -> Self {
        Self {
            cpu: Mutex::new(CpuSampler::new(sources.ticks)),
            memory: MemorySampler::new(sources.memory),
            gpu: sources.gpu,
        }
    }

    pub fn memory_status(&self) -> Option<MemoryStatus> {
        self.memory.status()
    }

    pub fn gpu_status(&self) -> Option<SessionStatus> {
        self.gpu.as_ref().map(|gpu| gpu.status())
    }

    fn dispose_gpu(&self) {
        if let Some(gpu) = &self.gpu {
            gpu.dispose();
        }
    }
}

impl SampleSource for Samplers {
    fn compose(&self) -> Sample {
        let cpu = self.cpu.lock().sample();
        let memory = self.memory.sample();
        let gpu = self.gpu.as_ref().and_then(|gpu| gpu.usage());

        Sample::new(cpu, memory, gpu)
    }

    fn reset_baseline(&self) {
        self.cpu.lock().reset();
    }
}

/// Public sampling contract for the host application.
///
/// `start`/`stop` follow the host's activation of the feature; subscribers
/// receive one [`Sample`] per tick on the scheduler's runtime thread.
pub struct PerformanceMonitor {
    // Declared first so ticks stop before the GPU session is released
    scheduler: SamplingScheduler,
    samplers: Arc<Samplers>,
}

impl PerformanceMonitor {
    /// Monitor backed by the native sources of the current platform.
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        Self::with_sources(config, crate::platform::system::native_sources(config))
    }

    pub fn with_sources(config: &MonitorConfig, sources: SamplerSources) -> Result<Self> {
        config.validate()?;

        let samplers = Arc::new(Samplers::new(sources));
        let scheduler = SamplingScheduler::new(
            Arc::clone(&samplers) as Arc<dyn SampleSource>,
            config.interval(),
            config.channel_capacity,
        )?;

        Ok(Self {
            scheduler,
            samplers,
        })
    }

    pub fn start(&self) {
        self.scheduler.start();
    }

    pub fn stop(&self) {
        self.scheduler.stop();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Compose a sample synchronously on the calling thread.
    ///
    /// Blocks for the GPU settle delay when a GPU session is active.
    pub fn current_sample(&self) -> Sample {
        self.samplers.compose()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Sample> {
        self.scheduler.subscribe()
    }

    pub fn latest_sample(&self) -> Option<Sample> {
        self.scheduler.latest_sample()
    }

    pub fn memory_status(&self) -> Option<MemoryStatus> {
        self.samplers.memory_status()
    }

    /// `None` when the GPU metric is disabled.
    pub fn gpu_status(&self) -> Option<SessionStatus> {
        self.samplers.gpu_status()
    }

    /// Stop sampling and release the GPU counter session.
    ///
    /// Sampling can be started again; the GPU session is rebuilt on demand.
    pub fn dispose(&self) {
        self.scheduler.stop();
        self.samplers.dispose_gpu();
    }
}
