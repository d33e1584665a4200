//! Native sampler sources for the current target.

#[cfg(windows)]
pub mod windows;

#[cfg(not(windows))]
pub mod unix;

use crate::core::config::MonitorConfig;
use crate::core::perf_monitor::gpu::{
    AdapterSource, GpuAdapterClassifier, GpuCounterSession, GpuUsageSource, SessionOptions,
};
use crate::core::perf_monitor::{MemorySource, SamplerSources, TickSource};

#[cfg(windows)]
pub type NativeCounterBackend = windows::PdhBackend;

#[cfg(not(windows))]
pub type NativeCounterBackend = unix::UnsupportedCounterBackend;

pub fn native_tick_source() -> Box<dyn TickSource> {
    #[cfg(windows)]
    {
        Box::new(windows::SystemTimesSource)
    }
    #[cfg(not(windows))]
    {
        Box::new(unix::ProcStatSource)
    }
}

pub fn native_memory_source() -> Box<dyn MemorySource> {
    #[cfg(windows)]
    {
        Box::new(windows::GlobalMemorySource)
    }
    #[cfg(not(windows))]
    {
        Box::new(unix::SysinfoMemorySource::new())
    }
}

pub fn native_adapter_source() -> Box<dyn AdapterSource> {
    #[cfg(windows)]
    {
        Box::new(windows::RegistryAdapterSource)
    }
    #[cfg(not(windows))]
    {
        Box::new(unix::UnsupportedAdapterSource)
    }
}

fn native_counter_backend() -> NativeCounterBackend {
    #[cfg(windows)]
    {
        windows::PdhBackend
    }
    #[cfg(not(windows))]
    {
        unix::UnsupportedCounterBackend
    }
}

/// GPU counter session over the native backend and adapter source.
pub fn native_gpu_session(config: &MonitorConfig) -> GpuCounterSession<NativeCounterBackend> {
    GpuCounterSession::with_options(
        native_counter_backend(),
        GpuAdapterClassifier::new(native_adapter_source()),
        SessionOptions {
            settle_delay: config.gpu_settle_delay(),
            probe_counter_object: config.probe_gpu_counters,
        },
    )
}

pub fn native_sources(config: &MonitorConfig) -> SamplerSources {
    let gpu: Option<Box<dyn GpuUsageSource>> = if config.gpu_enabled {
        Some(Box::new(native_gpu_session(config)))
    } else {
        None
    };

    SamplerSources {
        ticks: native_tick_source(),
        memory: native_memory_source(),
        gpu,
    }
}
