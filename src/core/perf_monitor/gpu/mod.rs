//! GPU utilization: adapter detection and the counter session.

mod backend;
mod classifier;
mod session;

pub use backend::{
    engine_counter_path, parse_multi_sz, ArrayRead, CounterBackend, CounterReading,
    FALLBACK_INSTANCE_PATTERNS, GPU_ENGINE_OBJECT, UTILIZATION_COUNTER, WILDCARD_INSTANCE,
};
pub use classifier::{
    classify_signature, is_adapter_subkey, AdapterClassification, AdapterKind, AdapterSource,
    AdapterStrings, ClassificationRule, GpuAdapterClassifier, ADAPTER_RULES,
};
pub use session::{
    GpuCounterSession, GpuUsageSource, RegistrationStrategy, SessionOptions, SessionStatus,
    DEFAULT_SETTLE_DELAY,
};
