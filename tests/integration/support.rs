//! In-memory stand-ins for the native sampler sources.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use perfsill::core::perf_monitor::gpu::{
    engine_counter_path, ArrayRead, CounterBackend, CounterReading, GpuAdapterClassifier,
    GpuCounterSession, SessionOptions, WILDCARD_INSTANCE,
};
use perfsill::core::perf_monitor::{
    AdapterSource, AdapterStrings, CpuTicks, MemorySource, MemoryStatus, TickSource,
};
use perfsill::error::{PerfError, Result};

// ---------------------------------------------------------------------------
// Counter backend
// ---------------------------------------------------------------------------

/// Scripted behavior and call accounting of a [`FakePdh`].
#[derive(Debug, Default)]
pub struct PdhScript {
    pub fail_open: bool,
    /// Paths whose registration fails.
    pub rejected_paths: HashSet<String>,
    /// `None` makes instance enumeration fail.
    pub instances: Option<Vec<String>>,
    /// Per-path readings returned by the array read.
    pub readings: HashMap<String, Vec<CounterReading>>,
    /// Paths that only support scalar reads.
    pub scalar_only: HashSet<String>,
    pub object_has_instances: bool,
    pub fail_collect: bool,

    pub opened: usize,
    pub closed: usize,
    pub open_query: Option<u64>,
    pub registered: Vec<String>,
    pub collects: usize,
    pub enumerations: usize,
    pub next_query: u64,
}

impl PdhScript {
    pub fn reject_wildcard(&mut self) {
        self.rejected_paths
            .insert(engine_counter_path(WILDCARD_INSTANCE));
    }
}

/// Counter backend that panics on handle misuse: a second open query, or a
/// call made with a query that is already closed.
#[derive(Clone, Default)]
pub struct FakePdh {
    pub script: Arc<Mutex<PdhScript>>,
}

#[derive(Debug)]
pub struct FakeCounter {
    query: u64,
    path: String,
}

impl FakePdh {
    pub fn new(script: PdhScript) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
        }
    }
}

fn assert_open(script: &PdhScript, query: u64) {
    assert_eq!(script.open_query, Some(query), "query {} used after close", query);
}

impl CounterBackend for FakePdh {
    type Query = u64;
    type Counter = FakeCounter;

    fn open_query(&mut self) -> Result<u64> {
        let mut script = self.script.lock();
        assert!(script.open_query.is_none(), "second query opened while one is open");
        if script.fail_open {
            return Err(PerfError::native("PdhOpenQueryW", 0xC0000BB8));
        }

        script.next_query += 1;
        let id = script.next_query;
        script.open_query = Some(id);
        script.opened += 1;
        Ok(id)
    }

    fn close_query(&mut self, query: u64) {
        let mut script = self.script.lock();
        assert_open(&script, query);
        script.open_query = None;
        script.closed += 1;
    }

    fn add_counter(&mut self, query: &u64, path: &str) -> Result<FakeCounter> {
        let mut script = self.script.lock();
        assert_open(&script, *query);
        if script.rejected_paths.contains(path) {
            return Err(PerfError::native("PdhAddEnglishCounterW", 0xC0000BB9));
        }

        script.registered.push(path.to_string());
        Ok(FakeCounter {
            query: *query,
            path: path.to_string(),
        })
    }

    fn collect(&mut self, query: &u64) -> Result<()> {
        let mut script = self.script.lock();
        assert_open(&script, *query);
        script.collects += 1;
        if script.fail_collect {
            return Err(PerfError::native("PdhCollectQueryData", 0x800007D5));
        }
        Ok(())
    }

    fn read_array(&mut self, counter: &FakeCounter) -> Result<ArrayRead> {
        let script = self.script.lock();
        assert_open(&script, counter.query);
        if script.scalar_only.contains(&counter.path) {
            return Ok(ArrayRead::NotApplicable);
        }
        Ok(ArrayRead::Items(
            script.readings.get(&counter.path).cloned().unwrap_or_default(),
        ))
    }

    fn read_scalar(&mut self, counter: &FakeCounter) -> Result<CounterReading> {
        let script = self.script.lock();
        assert_open(&script, counter.query);
        Ok(script
            .readings
            .get(&counter.path)
            .and_then(|values| values.first().copied())
            .unwrap_or_else(CounterReading::invalid))
    }

    fn enumerate_instances(&mut self, _object: &str) -> Result<Vec<String>> {
        let mut script = self.script.lock();
        script.enumerations += 1;
        script
            .instances
            .clone()
            .ok_or_else(|| PerfError::native("PdhEnumObjectItemsW", 0xC0000BB8))
    }

    fn object_has_instances(&mut self, _object: &str) -> bool {
        self.script.lock().object_has_instances
    }
}

// ---------------------------------------------------------------------------
// Adapter source
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeAdapters {
    pub fail_listing: bool,
    pub adapters: Vec<(String, AdapterStrings)>,
    /// Subkeys whose values cannot be read.
    pub unreadable: HashSet<String>,
}

impl FakeAdapters {
    pub fn with(adapters: &[(&str, &str, &str)]) -> Self {
        Self {
            adapters: adapters
                .iter()
                .map(|(subkey, desc, id)| {
                    (
                        subkey.to_string(),
                        AdapterStrings {
                            driver_desc: Some(desc.to_string()),
                            matching_device_id: Some(id.to_string()),
                        },
                    )
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn dedicated() -> Self {
        Self::with(&[(
            "0000",
            "NVIDIA GeForce RTX 4090",
            "pci\\ven_10de&dev_2684",
        )])
    }

    pub fn integrated_only() -> Self {
        Self::with(&[(
            "0000",
            "Intel(R) UHD Graphics 770",
            "pci\\ven_8086&dev_4680",
        )])
    }
}

impl AdapterSource for FakeAdapters {
    fn subkey_names(&self) -> Result<Vec<String>> {
        if self.fail_listing {
            return Err(PerfError::registry("adapter class not found"));
        }
        Ok(self.adapters.iter().map(|(subkey, _)| subkey.clone()).collect())
    }

    fn adapter_strings(&self, subkey: &str) -> Result<AdapterStrings> {
        if self.unreadable.contains(subkey) {
            return Err(PerfError::registry(format!("access denied: {}", subkey)));
        }
        self.adapters
            .iter()
            .find(|(name, _)| name == subkey)
            .map(|(_, strings)| strings.clone())
            .ok_or_else(|| PerfError::registry(format!("missing subkey {}", subkey)))
    }
}

pub fn fast_options() -> SessionOptions {
    SessionOptions {
        settle_delay: std::time::Duration::from_millis(1),
        probe_counter_object: true,
    }
}

/// Session over a dedicated adapter and the given script.
pub fn session(script: PdhScript) -> (GpuCounterSession<FakePdh>, FakePdh) {
    session_with(FakeAdapters::dedicated(), script, fast_options())
}

pub fn session_with(
    adapters: FakeAdapters,
    script: PdhScript,
    options: SessionOptions,
) -> (GpuCounterSession<FakePdh>, FakePdh) {
    let backend = FakePdh::new(script);
    let handle = backend.clone();
    let session = GpuCounterSession::with_options(
        backend,
        GpuAdapterClassifier::new(Box::new(adapters)),
        options,
    );
    (session, handle)
}

// ---------------------------------------------------------------------------
// CPU and memory
// ---------------------------------------------------------------------------

/// Tick source whose counters the test moves by hand.
#[derive(Clone, Default)]
pub struct ManualTicks {
    pub ticks: Arc<Mutex<CpuTicks>>,
}

impl ManualTicks {
    pub fn advance(&self, idle: u64, kernel: u64, user: u64) {
        let mut ticks = self.ticks.lock();
        ticks.idle += idle;
        ticks.kernel += kernel;
        ticks.user += user;
    }
}

impl TickSource for ManualTicks {
    fn read_ticks(&self) -> Result<CpuTicks> {
        Ok(*self.ticks.lock())
    }
}

pub struct FixedMemory(pub f64);

impl MemorySource for FixedMemory {
    fn read_status(&self) -> Result<MemoryStatus> {
        Ok(MemoryStatus {
            load_percent: self.0,
            total_bytes: 16 * 1024 * 1024 * 1024,
            available_bytes: 8 * 1024 * 1024 * 1024,
        })
    }
}
