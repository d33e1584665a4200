use winreg::enums::*;
use winreg::RegKey;

use crate::core::perf_monitor::gpu::{AdapterSource, AdapterStrings};
use crate::error::{PerfError, Result};

/// Display adapter device class (GUID_DEVCLASS_DISPLAY)
const DISPLAY_ADAPTER_CLASS: &str =
    r"SYSTEM\CurrentControlSet\Control\Class\{4d36e968-e325-11ce-bfc1-08002be10318}";

/// Display adapter entries from the registry.
pub struct RegistryAdapterSource;

impl RegistryAdapterSource {
    fn open_class_key() -> Result<RegKey> {
        RegKey::predef(HKEY_LOCAL_MACHINE)
            .open_subkey_with_flags(DISPLAY_ADAPTER_CLASS, KEY_READ)
            .map_err(|e| PerfError::registry(format!("Failed to open display adapter class: {}", e)))
    }
}

impl AdapterSource for RegistryAdapterSource {
    fn subkey_names(&self) -> Result<Vec<String>> {
        let class_key = Self::open_class_key()?;

        // Enumeration stops at the first entry that cannot be read
        Ok(class_key.enum_keys().map_while(|name| name.ok()).collect())
    }

    fn adapter_strings(&self, subkey: &str) -> Result<AdapterStrings> {
        let adapter = Self::open_class_key()?
            .open_subkey_with_flags(subkey, KEY_READ)
            .map_err(|e| PerfError::registry(format!("Failed to open adapter {}: {}", subkey, e)))?;

        Ok(AdapterStrings {
            driver_desc: adapter.get_value::<String, _>("DriverDesc").ok(),
            matching_device_id: adapter.get_value::<String, _>("MatchingDeviceId").ok(),
        })
    }
}
