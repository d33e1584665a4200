//! Fixed-cadence sampling on a background Tokio runtime.
//!
//! One task per running period drives an interval timer. Each tick runs the
//! blocking sampling work on the blocking pool and waits for it before the
//! next tick, so at most one sample is in flight.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Runtime;
use tokio::sync::{broadcast, watch};
use tokio::time::{interval, MissedTickBehavior};

use super::sample::Sample;
use crate::error::{PerfError, Result};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Work performed by the scheduler on every tick.
pub trait SampleSource: Send + Sync + 'static {
    /// Compose one sample. May block.
    fn compose(&self) -> Sample;

    /// Called on every transition into the running state, before the first tick.
    fn reset_baseline(&self);
}

/// Fan-out for published samples.
struct Publisher {
    samples: broadcast::Sender<Sample>,
    latest: watch::Sender<Option<Sample>>,
}

impl Publisher {
    fn publish(&self, sample: Sample) {
        self.latest.send_replace(Some(sample));
        // send() only fails if there are no subscribers (which is fine)
        let _ = self.samples.send(sample);
    }
}

#[derive(Default)]
struct ScheduleState {
    running: bool,
    shutdown_tx: Option<broadcast::Sender<()>>,
}

pub struct SamplingScheduler {
    runtime: Option<Runtime>,
    source: Arc<dyn SampleSource>,
    period: Duration,
    state: Mutex<ScheduleState>,
    publisher: Arc<Publisher>,
}

impl SamplingScheduler {
    /// Create a stopped scheduler.
    pub fn new(source: Arc<dyn SampleSource>, period: Duration, capacity: usize) -> Result<Self> {
        if period.is_zero() {
            return Err(PerfError::config("sampling interval must be greater than zero"));
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_time()
            .thread_name("perf-sampler")
            .build()?;

        let (samples, _) = broadcast::channel(capacity.max(1));
        let (latest, _) = watch::channel(None);

        Ok(Self {
            runtime: Some(runtime),
            source,
            period,
            state: Mutex::new(ScheduleState::default()),
            publisher: Arc::new(Publisher { samples, latest }),
        })
    }

    /// Start ticking. No-op when already running.
    pub fn start(&self) {
        let mut state = self.state.lock();
        if state.running {
            log::debug!("Sampling already running");
            return;
        }

        let Some(runtime) = self.runtime.as_ref() else {
            return;
        };

        self.source.reset_baseline();

        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        runtime.spawn(tick_loop(
            Arc::clone(&self.source),
            self.period,
            Arc::clone(&self.publisher),
            shutdown_rx,
        ));

        state.running = true;
        state.shutdown_tx = Some(shutdown_tx);
        log::info!("Performance sampling started ({} ms interval)", self.period.as_millis());
    }

    /// Stop ticking. A tick already in progress still completes and publishes.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if !state.running {
            return;
        }

        state.running = false;
        if let Some(shutdown_tx) = state.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        log::info!("Performance sampling stopped");
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Receive every sample published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Sample> {
        self.publisher.samples.subscribe()
    }

    /// Most recently published sample, if any tick has completed.
    pub fn latest_sample(&self) -> Option<Sample> {
        *self.publisher.latest.borrow()
    }
}

impl Drop for SamplingScheduler {
    fn drop(&mut self) {
        self.stop();
        if let Some(runtime) = self.runtime.take() {
            // Blocking on shutdown is not allowed inside another runtime
            if tokio::runtime::Handle::try_current().is_ok() {
                runtime.shutdown_background();
            } else {
                runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
            }
        }
    }
}

async fn tick_loop(
    source: Arc<dyn SampleSource>,
    period: Duration,
    publisher: Arc<Publisher>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                break;
            }
            _ = ticker.tick() => {
                let source = Arc::clone(&source);
                match tokio::task::spawn_blocking(move || source.compose()).await {
                    Ok(sample) => publisher.publish(sample),
                    Err(e) => log::error!("Sampling tick failed, skipping: {}", e),
                }
            }
        }
    }
}
