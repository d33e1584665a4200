//! Performance sampling engine.
//!
//! This module provides CPU, memory and GPU utilization samplers, the
//! fixed-cadence scheduler that drives them, and the composition root the
//! host application talks to.

mod cpu;
pub mod gpu;
mod memory;
mod sample;
mod scheduler;
mod service;

pub use cpu::{usage_between, CpuSampler, CpuTicks, TickSource};
pub use gpu::{
    AdapterClassification, AdapterSource, AdapterStrings, CounterBackend, GpuAdapterClassifier,
    GpuCounterSession, GpuUsageSource, RegistrationStrategy, SessionOptions, SessionStatus,
};
pub use memory::{MemorySampler, MemorySource, MemoryStatus};
pub use sample::{clamp_percent, Metric, Sample};
pub use scheduler::{SampleSource, SamplingScheduler};
pub use service::{PerformanceMonitor, SamplerSources, Samplers};
