use windows_sys::Win32::System::SystemInformation::{GlobalMemoryStatusEx, MEMORYSTATUSEX};

use crate::core::perf_monitor::{MemorySource, MemoryStatus};
use crate::error::{PerfError, Result};

/// Memory load from `GlobalMemoryStatusEx`.
pub struct GlobalMemorySource;

impl MemorySource for GlobalMemorySource {
    fn read_status(&self) -> Result<MemoryStatus> {
        // SAFETY: MEMORYSTATUSEX is plain old data; all-zero is a valid value
        let mut status: MEMORYSTATUSEX = unsafe { std::mem::zeroed() };
        status.dwLength = std::mem::size_of::<MEMORYSTATUSEX>() as u32;

        // SAFETY: dwLength is set and the pointer refers to a live struct
        let ok = unsafe { GlobalMemoryStatusEx(&mut status) };
        if ok == 0 {
            return Err(PerfError::Io(std::io::Error::last_os_error()));
        }

        Ok(MemoryStatus {
            load_percent: status.dwMemoryLoad as f64,
            total_bytes: status.ullTotalPhys,
            available_bytes: status.ullAvailPhys,
        })
    }
}
