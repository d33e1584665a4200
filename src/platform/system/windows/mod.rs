// Windows native sources

pub mod cpu;
pub mod gpu;
pub mod pdh;
pub mod ram;

pub use cpu::SystemTimesSource;
pub use gpu::RegistryAdapterSource;
pub use pdh::{PdhBackend, PdhCounter, PdhQuery};
pub use ram::GlobalMemorySource;
