use std::thread;
use std::time::{Duration, Instant};

use perfsill::core::config::MonitorConfig;
use perfsill::core::perf_monitor::gpu::{
    engine_counter_path, CounterReading, GpuUsageSource, SessionStatus, WILDCARD_INSTANCE,
};
use perfsill::core::perf_monitor::{PerformanceMonitor, Sample, SamplerSources};
use tokio::sync::broadcast::{self, error::TryRecvError};

use super::support::{session, FixedMemory, ManualTicks, PdhScript};

fn fast_config() -> MonitorConfig {
    MonitorConfig {
        interval_ms: 20,
        gpu_settle_delay_ms: 1,
        ..Default::default()
    }
}

fn sources(ticks: &ManualTicks, gpu: Option<Box<dyn GpuUsageSource>>) -> SamplerSources {
    SamplerSources {
        ticks: Box::new(ticks.clone()),
        memory: Box::new(FixedMemory(48.0)),
        gpu,
    }
}

fn recv_within(rx: &mut broadcast::Receiver<Sample>, timeout: Duration) -> Option<Sample> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        match rx.try_recv() {
            Ok(sample) => return Some(sample),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Closed) => return None,
            Err(TryRecvError::Empty) => thread::sleep(Duration::from_millis(5)),
        }
    }
    None
}

fn drain(rx: &mut broadcast::Receiver<Sample>) {
    while !matches!(rx.try_recv(), Err(TryRecvError::Empty) | Err(TryRecvError::Closed)) {}
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = MonitorConfig {
        interval_ms: 0,
        ..Default::default()
    };
    let ticks = ManualTicks::default();

    assert!(PerformanceMonitor::with_sources(&config, sources(&ticks, None)).is_err());
}

#[test]
fn test_current_sample_measures_since_construction() {
    let ticks = ManualTicks::default();
    let monitor = PerformanceMonitor::with_sources(&fast_config(), sources(&ticks, None)).unwrap();

    // 300 of 400 elapsed ticks busy
    ticks.advance(100, 250, 150);
    let sample = monitor.current_sample();

    assert_eq!(sample.cpu_usage_percent, 75.0);
    assert_eq!(sample.memory_usage_percent, 48.0);
    assert_eq!(sample.gpu_usage_percent, None);
    assert!(!monitor.is_running());
}

#[test]
fn test_gpu_disabled_publishes_no_gpu_metric() {
    let ticks = ManualTicks::default();
    let monitor = PerformanceMonitor::with_sources(&fast_config(), sources(&ticks, None)).unwrap();
    let mut rx = monitor.subscribe();

    monitor.start();
    let sample = recv_within(&mut rx, Duration::from_secs(2)).expect("sample");
    monitor.stop();

    assert_eq!(sample.gpu_usage_percent, None);
    assert_eq!(monitor.gpu_status(), None);
}

#[test]
fn test_gpu_session_feeds_samples() {
    let mut script = PdhScript::default();
    script.readings.insert(
        engine_counter_path(WILDCARD_INSTANCE),
        vec![CounterReading::valid(33.0)],
    );
    let (gpu, pdh) = session(script);

    let gpu: Box<dyn GpuUsageSource> = Box::new(gpu);
    let ticks = ManualTicks::default();
    let monitor =
        PerformanceMonitor::with_sources(&fast_config(), sources(&ticks, Some(gpu))).unwrap();
    let mut rx = monitor.subscribe();

    monitor.start();
    let sample = recv_within(&mut rx, Duration::from_secs(2)).expect("sample");
    monitor.stop();

    assert_eq!(sample.gpu_usage_percent, Some(33.0));
    assert!(matches!(monitor.gpu_status(), Some(SessionStatus::Ready { .. })));

    // Let any in-flight tick finish before releasing the session
    thread::sleep(Duration::from_millis(100));
    monitor.dispose();
    assert_eq!(monitor.gpu_status(), Some(SessionStatus::Uninitialized));
    assert!(pdh.script.lock().open_query.is_none());
}

#[test]
fn test_restart_discards_stale_baseline() {
    let ticks = ManualTicks::default();
    let monitor = PerformanceMonitor::with_sources(&fast_config(), sources(&ticks, None)).unwrap();
    let mut rx = monitor.subscribe();

    monitor.start();
    assert!(recv_within(&mut rx, Duration::from_secs(2)).is_some());
    monitor.stop();

    thread::sleep(Duration::from_millis(100));
    drain(&mut rx);

    // Fully busy while stopped; must not show up after the restart
    ticks.advance(0, 1000, 1000);

    monitor.start();
    let first = recv_within(&mut rx, Duration::from_secs(2)).expect("sample after restart");
    monitor.stop();

    assert_eq!(first.cpu_usage_percent, 0.0);
}

#[test]
fn test_latest_sample_tracks_publication() {
    let ticks = ManualTicks::default();
    let monitor = PerformanceMonitor::with_sources(&fast_config(), sources(&ticks, None)).unwrap();
    let mut rx = monitor.subscribe();

    assert!(monitor.latest_sample().is_none());

    monitor.start();
    assert!(recv_within(&mut rx, Duration::from_secs(2)).is_some());
    monitor.stop();

    let latest = monitor.latest_sample().expect("latest sample");
    assert_eq!(latest.memory_usage_percent, 48.0);
    assert!(monitor.memory_status().is_some());
}

#[tokio::test]
async fn test_drop_inside_async_host_does_not_panic() {
    let ticks = ManualTicks::default();
    let monitor = PerformanceMonitor::with_sources(&fast_config(), sources(&ticks, None)).unwrap();

    monitor.start();
    tokio::time::sleep(Duration::from_millis(50)).await;
    monitor.stop();

    drop(monitor);
}
