//! Dedicated-GPU detection from installed display adapter entries.
//!
//! Adapter entries live under the display adapter device class. Each numeric
//! subkey is one adapter; its driver description and matching device id are
//! combined, upper-cased, and run through an ordered rule list.

use crate::error::Result;

/// Strings read from one display adapter entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterStrings {
    pub driver_desc: Option<String>,
    pub matching_device_id: Option<String>,
}

impl AdapterStrings {
    /// Upper-cased `"<DriverDesc> <MatchingDeviceId>"`, the text the rules match on.
    pub fn signature(&self) -> String {
        format!(
            "{} {}",
            self.driver_desc.as_deref().unwrap_or_default(),
            self.matching_device_id.as_deref().unwrap_or_default()
        )
        .to_uppercase()
    }
}

/// Access to the display adapter class entries.
pub trait AdapterSource: Send + Sync {
    /// Names of all subkeys under the adapter class, in enumeration order.
    fn subkey_names(&self) -> Result<Vec<String>>;

    /// Description and device id of one adapter subkey.
    fn adapter_strings(&self, subkey: &str) -> Result<AdapterStrings>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Dedicated,
    Integrated,
    Unknown,
}

/// One classification rule. Rules are evaluated top to bottom and the first
/// match decides.
#[derive(Debug, Clone, Copy)]
pub enum ClassificationRule {
    /// Any token present.
    AnyToken {
        tokens: &'static [&'static str],
        kind: AdapterKind,
    },
    /// PCI vendor id present and none of the `unless` markers present.
    VendorId {
        vendor: &'static str,
        unless: &'static [&'static str],
        kind: AdapterKind,
    },
}

impl ClassificationRule {
    fn matches(&self, signature: &str) -> Option<AdapterKind> {
        match self {
            ClassificationRule::AnyToken { tokens, kind } => tokens
                .iter()
                .any(|token| signature.contains(token))
                .then_some(*kind),
            ClassificationRule::VendorId {
                vendor,
                unless,
                kind,
            } => (signature.contains(vendor) && !unless.iter().any(|m| signature.contains(m)))
                .then_some(*kind),
        }
    }
}

const DEDICATED_TOKENS: &[&str] = &[
    "NVIDIA",
    "GEFORCE",
    "QUADRO",
    "TESLA",
    "RTX",
    "GTX",
    "AMD RADEON RX",
    "AMD RADEON R9",
    "AMD RADEON R7",
    "RADEON RX",
    "RADEON R9",
    "RADEON R7",
    "RADEON HD 7",
    "RADEON HD 6",
    "RADEON HD 5",
];

const INTEGRATED_TOKENS: &[&str] = &[
    "INTEL HD",
    "INTEL UHD",
    "INTEL IRIS",
    "AMD RADEON GRAPHICS",
    "RADEON VEGA",
    "INTEGRATED",
    "ONBOARD",
];

/// Brand tokens first, integrated exclusions second, vendor ids last.
pub const ADAPTER_RULES: &[ClassificationRule] = &[
    ClassificationRule::AnyToken {
        tokens: DEDICATED_TOKENS,
        kind: AdapterKind::Dedicated,
    },
    ClassificationRule::AnyToken {
        tokens: INTEGRATED_TOKENS,
        kind: AdapterKind::Integrated,
    },
    // NVIDIA
    ClassificationRule::VendorId {
        vendor: "VEN_10DE",
        unless: &[],
        kind: AdapterKind::Dedicated,
    },
    // AMD, excluding APUs
    ClassificationRule::VendorId {
        vendor: "VEN_1002",
        unless: &["RADEON GRAPHICS"],
        kind: AdapterKind::Dedicated,
    },
];

/// Classify an upper-cased adapter signature.
pub fn classify_signature(signature: &str) -> AdapterKind {
    ADAPTER_RULES
        .iter()
        .find_map(|rule| rule.matches(signature))
        .unwrap_or(AdapterKind::Unknown)
}

/// Adapter subkeys are purely numeric ("0000", "0001"); others such as
/// "Properties" are auxiliary.
pub fn is_adapter_subkey(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_digit())
}

/// Outcome of one adapter scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterClassification {
    pub has_dedicated_gpu: bool,
    /// Signature of the adapter that matched, when one did.
    pub adapter: Option<String>,
}

pub struct GpuAdapterClassifier {
    source: Box<dyn AdapterSource>,
}

impl GpuAdapterClassifier {
    pub fn new(source: Box<dyn AdapterSource>) -> Self {
        Self { source }
    }

    /// Walk the adapters, stopping at the first dedicated one.
    ///
    /// Fails only when the adapter class itself cannot be listed; an adapter
    /// entry that cannot be read is skipped.
    pub fn scan(&self) -> Result<AdapterClassification> {
        for subkey in self.source.subkey_names()? {
            if !is_adapter_subkey(&subkey) {
                continue;
            }

            let strings = match self.source.adapter_strings(&subkey) {
                Ok(strings) => strings,
                Err(e) => {
                    log::debug!("Skipping display adapter {}: {}", subkey, e);
                    continue;
                }
            };

            let signature = strings.signature();
            let kind = classify_signature(&signature);
            log::debug!("Display adapter {} classified as {:?}: {}", subkey, kind, signature.trim());

            if kind == AdapterKind::Dedicated {
                return Ok(AdapterClassification {
                    has_dedicated_gpu: true,
                    adapter: Some(signature.trim().to_string()),
                });
            }
        }

        Ok(AdapterClassification::default())
    }

    pub fn has_dedicated_gpu(&self) -> bool {
        match self.scan() {
            Ok(classification) => classification.has_dedicated_gpu,
            Err(e) => {
                log::debug!("Display adapter scan failed: {}", e);
                false
            }
        }
    }
}
