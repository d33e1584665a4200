// Platform-specific code module

pub mod system;

// Re-exports for cleaner imports
pub use system::{native_gpu_session, native_sources, NativeCounterBackend};
