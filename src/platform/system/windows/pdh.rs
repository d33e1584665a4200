//! Performance Data Helper (PDH) counter backend.

use std::mem::size_of;
use std::ptr;

use windows_sys::Win32::System::Performance::{
    PdhAddEnglishCounterW, PdhCloseQuery, PdhCollectQueryData, PdhEnumObjectItemsW,
    PdhGetFormattedCounterArrayW, PdhGetFormattedCounterValue, PdhOpenQueryW, PDH_CSTATUS_VALID_DATA,
    PDH_FMT_COUNTERVALUE, PDH_FMT_COUNTERVALUE_ITEM_W, PDH_FMT_DOUBLE, PDH_HCOUNTER, PDH_HQUERY,
    PDH_MORE_DATA, PERF_DETAIL_WIZARD,
};

use crate::core::perf_monitor::gpu::{parse_multi_sz, ArrayRead, CounterBackend, CounterReading};
use crate::error::{PerfError, Result};

const ERROR_SUCCESS: u32 = 0;

/// Array reads retry while instances keep appearing between the size probe
/// and the read.
const MAX_ARRAY_ATTEMPTS: usize = 4;

/// Open PDH query handle.
pub struct PdhQuery(PDH_HQUERY);

/// Counter handle registered on a [`PdhQuery`].
pub struct PdhCounter(PDH_HCOUNTER);

// SAFETY: PDH handles are process-wide and not tied to the creating thread;
// the session serializes every call made with them.
unsafe impl Send for PdhQuery {}
unsafe impl Send for PdhCounter {}

pub struct PdhBackend;

fn check(call: &'static str, status: u32) -> Result<()> {
    if status == ERROR_SUCCESS {
        Ok(())
    } else {
        Err(PerfError::native(call, status))
    }
}

fn is_more_data(status: u32) -> bool {
    status == PDH_MORE_DATA as u32
}

fn to_wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}

fn reading(value: &PDH_FMT_COUNTERVALUE) -> CounterReading {
    CounterReading {
        // SAFETY: values were requested with PDH_FMT_DOUBLE
        value: unsafe { value.Anonymous.doubleValue },
        valid: value.CStatus == PDH_CSTATUS_VALID_DATA as u32,
    }
}

impl CounterBackend for PdhBackend {
    type Query = PdhQuery;
    type Counter = PdhCounter;

    fn open_query(&mut self) -> Result<PdhQuery> {
        // SAFETY: a zeroed handle is the "no handle" value PDH overwrites
        let mut query: PDH_HQUERY = unsafe { std::mem::zeroed() };
        // SAFETY: null data source means real-time data; out pointer is live
        let status = unsafe { PdhOpenQueryW(ptr::null(), 0, &mut query) };
        check("PdhOpenQueryW", status)?;
        Ok(PdhQuery(query))
    }

    fn close_query(&mut self, query: PdhQuery) {
        // SAFETY: the handle came from PdhOpenQueryW and is closed exactly once
        let status = unsafe { PdhCloseQuery(query.0) };
        if status != ERROR_SUCCESS {
            log::debug!("PdhCloseQuery returned 0x{:08X}", status);
        }
    }

    fn add_counter(&mut self, query: &PdhQuery, path: &str) -> Result<PdhCounter> {
        let path = to_wide(path);
        // SAFETY: zeroed handle, overwritten on success
        let mut counter: PDH_HCOUNTER = unsafe { std::mem::zeroed() };
        // SAFETY: path is NUL-terminated and outlives the call
        let status = unsafe { PdhAddEnglishCounterW(query.0, path.as_ptr(), 0, &mut counter) };
        check("PdhAddEnglishCounterW", status)?;
        Ok(PdhCounter(counter))
    }

    fn collect(&mut self, query: &PdhQuery) -> Result<()> {
        // SAFETY: query handle is open
        let status = unsafe { PdhCollectQueryData(query.0) };
        check("PdhCollectQueryData", status)
    }

    fn read_array(&mut self, counter: &PdhCounter) -> Result<ArrayRead> {
        let mut buffer_size = 0u32;
        let mut item_count = 0u32;

        // Size probe: a null buffer asks PDH for the required byte count
        // SAFETY: null item buffer with zero size is the documented probe form
        let status = unsafe {
            PdhGetFormattedCounterArrayW(
                counter.0,
                PDH_FMT_DOUBLE,
                &mut buffer_size,
                &mut item_count,
                ptr::null_mut(),
            )
        };
        if !is_more_data(status) || item_count == 0 {
            return Ok(ArrayRead::NotApplicable);
        }

        let item_size = size_of::<PDH_FMT_COUNTERVALUE_ITEM_W>();
        for _ in 0..MAX_ARRAY_ATTEMPTS {
            // Instance names are stored after the items, inside the same buffer
            let capacity = (buffer_size as usize).div_ceil(item_size);
            let mut items: Vec<PDH_FMT_COUNTERVALUE_ITEM_W> = Vec::with_capacity(capacity);
            buffer_size = (capacity * item_size) as u32;

            // SAFETY: buffer_size describes exactly the allocation behind items
            let status = unsafe {
                PdhGetFormattedCounterArrayW(
                    counter.0,
                    PDH_FMT_DOUBLE,
                    &mut buffer_size,
                    &mut item_count,
                    items.as_mut_ptr(),
                )
            };

            if is_more_data(status) {
                // buffer_size now holds the new requirement
                continue;
            }
            check("PdhGetFormattedCounterArrayW", status)?;

            let count = (item_count as usize).min(capacity);
            // SAFETY: PDH initialized item_count items at the start of the buffer
            unsafe { items.set_len(count) };

            return Ok(ArrayRead::Items(
                items.iter().map(|item| reading(&item.FmtValue)).collect(),
            ));
        }

        Err(PerfError::metric_collection(
            "GPU engine instance count kept changing while reading counters",
        ))
    }

    fn read_scalar(&mut self, counter: &PdhCounter) -> Result<CounterReading> {
        // SAFETY: PDH_FMT_COUNTERVALUE is plain old data
        let mut value: PDH_FMT_COUNTERVALUE = unsafe { std::mem::zeroed() };
        // SAFETY: counter handle is registered; value pointer is live
        let status = unsafe {
            PdhGetFormattedCounterValue(counter.0, PDH_FMT_DOUBLE, ptr::null_mut(), &mut value)
        };
        check("PdhGetFormattedCounterValue", status)?;
        Ok(reading(&value))
    }

    fn enumerate_instances(&mut self, object: &str) -> Result<Vec<String>> {
        let object = to_wide(object);
        let mut counter_len = 0u32;
        let mut instance_len = 0u32;

        // SAFETY: null lists with zero lengths request the required sizes
        let status = unsafe {
            PdhEnumObjectItemsW(
                ptr::null(),
                ptr::null(),
                object.as_ptr(),
                ptr::null_mut(),
                &mut counter_len,
                ptr::null_mut(),
                &mut instance_len,
                PERF_DETAIL_WIZARD,
                0,
            )
        };
        if !is_more_data(status) {
            check("PdhEnumObjectItemsW", status)?;
            return Ok(Vec::new());
        }
        if instance_len == 0 {
            return Ok(Vec::new());
        }

        let mut counters = vec![0u16; counter_len as usize];
        let mut instances = vec![0u16; instance_len as usize];

        // SAFETY: both buffers are sized in characters as PDH requested
        let status = unsafe {
            PdhEnumObjectItemsW(
                ptr::null(),
                ptr::null(),
                object.as_ptr(),
                counters.as_mut_ptr(),
                &mut counter_len,
                instances.as_mut_ptr(),
                &mut instance_len,
                PERF_DETAIL_WIZARD,
                0,
            )
        };
        check("PdhEnumObjectItemsW", status)?;

        Ok(parse_multi_sz(&instances))
    }

    fn object_has_instances(&mut self, object: &str) -> bool {
        let object = to_wide(object);
        let mut counter_len = 0u32;
        let mut instance_len = 0u32;

        // SAFETY: size probe form, see enumerate_instances
        let status = unsafe {
            PdhEnumObjectItemsW(
                ptr::null(),
                ptr::null(),
                object.as_ptr(),
                ptr::null_mut(),
                &mut counter_len,
                ptr::null_mut(),
                &mut instance_len,
                PERF_DETAIL_WIZARD,
                0,
            )
        };

        is_more_data(status) && instance_len > 0
    }
}
