use windows_sys::Win32::Foundation::FILETIME;
use windows_sys::Win32::System::Threading::GetSystemTimes;

use crate::core::perf_monitor::{CpuTicks, TickSource};
use crate::error::{PerfError, Result};

/// Cumulative system times from `GetSystemTimes`, in 100 ns units.
pub struct SystemTimesSource;

impl TickSource for SystemTimesSource {
    fn read_ticks(&self) -> Result<CpuTicks> {
        let mut idle = empty_filetime();
        let mut kernel = empty_filetime();
        let mut user = empty_filetime();

        // SAFETY: all three pointers refer to live, writable FILETIME values
        let ok = unsafe { GetSystemTimes(&mut idle, &mut kernel, &mut user) };
        if ok == 0 {
            return Err(PerfError::Io(std::io::Error::last_os_error()));
        }

        Ok(CpuTicks {
            idle: filetime_to_u64(&idle),
            kernel: filetime_to_u64(&kernel),
            user: filetime_to_u64(&user),
        })
    }
}

fn empty_filetime() -> FILETIME {
    FILETIME {
        dwLowDateTime: 0,
        dwHighDateTime: 0,
    }
}

fn filetime_to_u64(time: &FILETIME) -> u64 {
    ((time.dwHighDateTime as u64) << 32) | time.dwLowDateTime as u64
}
