//! GPU engine utilization through a performance-counter query session.
//!
//! The session lazily detects a dedicated GPU, opens one query, and registers
//! utilization counters using the first strategy that works:
//!
//! 1. a single wildcard counter over every engine instance,
//! 2. one counter per enumerated engine instance,
//! 3. one counter per fixed fallback instance pattern.
//!
//! Collection is two-phase (collect, wait, collect) because utilization is a
//! rate counter. Per-instance values are summed and the total clamped to
//! `[0, 100]`.

use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use super::backend::{
    engine_counter_path, ArrayRead, CounterBackend, FALLBACK_INSTANCE_PATTERNS, GPU_ENGINE_OBJECT,
    WILDCARD_INSTANCE,
};
use super::classifier::GpuAdapterClassifier;
use crate::core::perf_monitor::sample::clamp_percent;

/// Default gap between the two collections of one reading.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Which registration strategy produced the session's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStrategy {
    Wildcard,
    EnumeratedInstances,
    FallbackPatterns,
}

/// Externally observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Uninitialized,
    Ready {
        strategy: RegistrationStrategy,
        counters: usize,
    },
    Failed,
}

/// Options for building a [`GpuCounterSession`].
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub settle_delay: Duration,
    /// Treat an existing GPU engine object with instances as a dedicated GPU
    /// when the adapter scan finds none.
    pub probe_counter_object: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            probe_counter_object: true,
        }
    }
}

/// Open query plus the counters registered on it. Never empty.
struct OpenCounters<Q, C> {
    query: Q,
    counters: Vec<C>,
    strategy: RegistrationStrategy,
}

enum SessionState<Q, C> {
    Uninitialized,
    Ready(OpenCounters<Q, C>),
    Failed,
}

struct SessionInner<B: CounterBackend> {
    backend: B,
    classifier: GpuAdapterClassifier,
    options: SessionOptions,
    /// Cached until the session is disposed.
    dedicated_gpu: Option<bool>,
    state: SessionState<B::Query, B::Counter>,
}

/// Object-safe view of a GPU usage reader, used by the sampler composition.
pub trait GpuUsageSource: Send + Sync {
    fn usage(&self) -> Option<f64>;

    fn status(&self) -> SessionStatus;

    fn dispose(&self);
}

pub struct GpuCounterSession<B: CounterBackend> {
    inner: Mutex<SessionInner<B>>,
}

impl<B: CounterBackend> GpuCounterSession<B> {
    pub fn new(backend: B, classifier: GpuAdapterClassifier) -> Self {
        Self::with_options(backend, classifier, SessionOptions::default())
    }

    pub fn with_options(backend: B, classifier: GpuAdapterClassifier, options: SessionOptions) -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                backend,
                classifier,
                options,
                dedicated_gpu: None,
                state: SessionState::Uninitialized,
            }),
        }
    }

    /// Current GPU utilization, or `None` when no GPU metric is available.
    ///
    /// Initializes the session on first use. Concurrent callers wait for the
    /// collection in progress.
    pub fn get_usage(&self) -> Option<f64> {
        let mut inner = self.inner.lock();

        if matches!(inner.state, SessionState::Uninitialized) {
            inner.initialize();
        }

        inner.collect()
    }

    pub fn status(&self) -> SessionStatus {
        let inner = self.inner.lock();
        match &inner.state {
            SessionState::Uninitialized => SessionStatus::Uninitialized,
            SessionState::Ready(open) => SessionStatus::Ready {
                strategy: open.strategy,
                counters: open.counters.len(),
            },
            SessionState::Failed => SessionStatus::Failed,
        }
    }

    /// Release the query and its counters and forget the GPU detection.
    ///
    /// The next [`get_usage`](Self::get_usage) starts over. Safe to call
    /// repeatedly.
    pub fn dispose(&self) {
        let mut inner = self.inner.lock();
        inner.release();
        inner.dedicated_gpu = None;
    }
}

impl<B: CounterBackend> Drop for GpuCounterSession<B> {
    fn drop(&mut self) {
        self.inner.get_mut().release();
    }
}

impl<B: CounterBackend> GpuUsageSource for GpuCounterSession<B> {
    fn usage(&self) -> Option<f64> {
        self.get_usage()
    }

    fn status(&self) -> SessionStatus {
        GpuCounterSession::status(self)
    }

    fn dispose(&self) {
        GpuCounterSession::dispose(self)
    }
}

impl<B: CounterBackend> SessionInner<B> {
    fn has_dedicated_gpu(&mut self) -> bool {
        if let Some(cached) = self.dedicated_gpu {
            return cached;
        }

        let mut detected = self.classifier.has_dedicated_gpu();
        if !detected && self.options.probe_counter_object {
            detected = self.backend.object_has_instances(GPU_ENGINE_OBJECT);
            if detected {
                log::debug!("No dedicated adapter found, but {} counters exist", GPU_ENGINE_OBJECT);
            }
        }

        self.dedicated_gpu = Some(detected);
        detected
    }

    /// Close the open query, if any, and return to `Uninitialized`.
    fn release(&mut self) {
        let state = std::mem::replace(&mut self.state, SessionState::Uninitialized);
        if let SessionState::Ready(open) = state {
            self.backend.close_query(open.query);
        }
    }

    fn initialize(&mut self) {
        self.state = match self.build() {
            Some(open) => {
                log::info!(
                    "GPU counter session ready ({:?}, {} counter(s))",
                    open.strategy,
                    open.counters.len()
                );
                SessionState::Ready(open)
            }
            None => SessionState::Failed,
        };
    }

    fn build(&mut self) -> Option<OpenCounters<B::Query, B::Counter>> {
        if !self.has_dedicated_gpu() {
            log::info!("No dedicated GPU detected, GPU usage will be unavailable");
            return None;
        }

        self.release();

        let query = match self.backend.open_query() {
            Ok(query) => query,
            Err(e) => {
                log::warn!("Failed to open GPU counter query: {}", e);
                return None;
            }
        };

        match self
            .backend
            .add_counter(&query, &engine_counter_path(WILDCARD_INSTANCE))
        {
            Ok(counter) => {
                return Some(OpenCounters {
                    query,
                    counters: vec![counter],
                    strategy: RegistrationStrategy::Wildcard,
                })
            }
            Err(e) => log::warn!("Wildcard GPU counter unavailable, enumerating instances: {}", e),
        }

        let (instances, strategy) = self.instance_names();
        let counters: Vec<B::Counter> = instances
            .iter()
            .filter_map(|instance| {
                self.backend
                    .add_counter(&query, &engine_counter_path(instance))
                    .map_err(|e| log::debug!("Skipping GPU engine instance {}: {}", instance, e))
                    .ok()
            })
            .collect();

        if counters.is_empty() {
            log::warn!("No GPU engine counter could be registered");
            self.backend.close_query(query);
            return None;
        }

        Some(OpenCounters {
            query,
            counters,
            strategy,
        })
    }

    fn instance_names(&mut self) -> (Vec<String>, RegistrationStrategy) {
        match self.backend.enumerate_instances(GPU_ENGINE_OBJECT) {
            Ok(instances) if !instances.is_empty() => {
                (instances, RegistrationStrategy::EnumeratedInstances)
            }
            Ok(_) => {
                log::warn!("{} reports no instances, using fallback patterns", GPU_ENGINE_OBJECT);
                (fallback_instances(), RegistrationStrategy::FallbackPatterns)
            }
            Err(e) => {
                log::warn!("Failed to enumerate {} instances, using fallback patterns: {}", GPU_ENGINE_OBJECT, e);
                (fallback_instances(), RegistrationStrategy::FallbackPatterns)
            }
        }
    }

    fn collect(&mut self) -> Option<f64> {
        let SessionState::Ready(open) = &self.state else {
            return None;
        };

        // Collection status is not fatal: a counter without fresh data reads
        // as invalid below.
        if let Err(e) = self.backend.collect(&open.query) {
            log::trace!("First GPU collection failed: {}", e);
        }
        thread::sleep(self.options.settle_delay);
        if let Err(e) = self.backend.collect(&open.query) {
            log::trace!("Second GPU collection failed: {}", e);
        }

        let mut total = 0.0;
        for counter in &open.counters {
            match self.backend.read_array(counter) {
                Ok(ArrayRead::Items(items)) => {
                    total += items
                        .iter()
                        .filter(|item| item.valid)
                        .map(|item| item.value)
                        .sum::<f64>();
                }
                Ok(ArrayRead::NotApplicable) => match self.backend.read_scalar(counter) {
                    Ok(reading) if reading.valid => total += reading.value,
                    Ok(_) => {}
                    Err(e) => log::trace!("GPU counter value unavailable: {}", e),
                },
                Err(e) => log::trace!("GPU counter array unavailable: {}", e),
            }
        }

        Some(clamp_percent(total))
    }
}

fn fallback_instances() -> Vec<String> {
    FALLBACK_INSTANCE_PATTERNS
        .iter()
        .map(|pattern| pattern.to_string())
        .collect()
}
