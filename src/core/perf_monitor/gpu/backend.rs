//! Native performance-counter seam used by the GPU counter session.

use crate::error::Result;

/// Performance object that exposes one instance per GPU engine.
pub const GPU_ENGINE_OBJECT: &str = "GPU Engine";

/// Per-engine utilization counter of [`GPU_ENGINE_OBJECT`].
pub const UTILIZATION_COUNTER: &str = "Utilization Percentage";

/// Instance name matching every GPU engine.
pub const WILDCARD_INSTANCE: &str = "*";

/// Instance patterns tried when engine instances cannot be enumerated.
pub const FALLBACK_INSTANCE_PATTERNS: [&str; 3] = [
    "pid_*_luid_*_phys_*_eng_*_engtype_3D",
    "pid_*_luid_*_phys_*_eng_*_engtype_Graphics",
    "pid_*_luid_*_phys_*_eng_*_engtype_Compute",
];

/// `\GPU Engine(<instance>)\Utilization Percentage`
pub fn engine_counter_path(instance: &str) -> String {
    format!("\\{}({})\\{}", GPU_ENGINE_OBJECT, instance, UTILIZATION_COUNTER)
}

/// One formatted counter value and whether its status marked it valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterReading {
    pub value: f64,
    pub valid: bool,
}

impl CounterReading {
    pub fn valid(value: f64) -> Self {
        Self { value, valid: true }
    }

    pub fn invalid() -> Self {
        Self {
            value: 0.0,
            valid: false,
        }
    }
}

/// Result of reading a counter as an instance array.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayRead {
    /// The counter expanded to these per-instance readings.
    Items(Vec<CounterReading>),
    /// The size probe did not report array data; read it as a scalar instead.
    NotApplicable,
}

/// Query/counter handle hierarchy of a PDH-style counter subsystem.
///
/// Closing a query releases every counter registered on it. Implementations
/// do not need internal locking: the session serializes every call.
pub trait CounterBackend: Send {
    type Query: Send;
    type Counter: Send;

    fn open_query(&mut self) -> Result<Self::Query>;

    fn close_query(&mut self, query: Self::Query);

    fn add_counter(&mut self, query: &Self::Query, path: &str) -> Result<Self::Counter>;

    fn collect(&mut self, query: &Self::Query) -> Result<()>;

    /// Read a counter as a formatted array, probing for the buffer size first.
    fn read_array(&mut self, counter: &Self::Counter) -> Result<ArrayRead>;

    fn read_scalar(&mut self, counter: &Self::Counter) -> Result<CounterReading>;

    /// Instance names of a performance object.
    fn enumerate_instances(&mut self, object: &str) -> Result<Vec<String>>;

    /// Whether a performance object exists and reports at least one instance.
    fn object_has_instances(&mut self, object: &str) -> bool;
}

/// Split a double-NUL terminated UTF-16 string list.
pub fn parse_multi_sz(buffer: &[u16]) -> Vec<String> {
    buffer
        .split(|&unit| unit == 0)
        .take_while(|item| !item.is_empty())
        .map(String::from_utf16_lossy)
        .collect()
}
