//! Device identifier sets and well-known device families.
//!
//! A [`DeviceSet`] is a build-once, read-forever collection of discrete PCI
//! device id strings plus inclusive numeric ranges. An empty set is the
//! wildcard "all devices". Well-known families (whole vendors, specific
//! chip generations, devices tied to a known bug) are published once as
//! shared singletons so that many rules can reference the same set without
//! copying it.

use std::sync::{Arc, OnceLock};

use crate::rule::DeviceVendor;

// ─────────────────────────────────────────────────────────────────────────────
// DeviceSet
// ─────────────────────────────────────────────────────────────────────────────

/// A set of device identifiers to match, or empty for all devices.
#[derive(Debug, Default)]
pub struct DeviceSet {
    ids: Vec<String>,
    ranges: Vec<DeviceRange>,
}

#[derive(Debug, Clone, Copy)]
struct DeviceRange {
    begin: i64,
    end: i64,
}

impl DeviceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a discrete device id ("0x2772").
    pub fn add(&mut self, id: &str) {
        self.ids.push(id.to_string());
    }

    /// Adds an inclusive `[begin, end]` id range.
    pub fn add_range(&mut self, begin: i64, end: i64) {
        debug_assert!(begin <= end, "inverted device range");
        self.ranges.push(DeviceRange { begin, end });
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.ranges.is_empty()
    }

    /// Membership test. An empty set matches everything; otherwise the id
    /// must appear verbatim in the discrete list or parse numerically into
    /// one of the ranges. Ids with no numeric form skip the range test.
    pub fn contains(&self, device_id: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        if self.ids.iter().any(|id| id == device_id) {
            return true;
        }
        if let Some(value) = parse_device_id(device_id) {
            return self
                .ranges
                .iter()
                .any(|r| value >= r.begin && value <= r.end);
        }
        false
    }
}

/// Numeric interpretation of a device id: "0x"-prefixed hex, else decimal.
fn parse_device_id(id: &str) -> Option<i64> {
    let id = id.trim();
    if let Some(hex) = id.strip_prefix("0x").or_else(|| id.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else {
        id.parse().ok()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Well-known families
// ─────────────────────────────────────────────────────────────────────────────

/// Named device families referenced by blocklist rules.
///
/// Each family resolves to a shared [`DeviceSet`] singleton built on first
/// use; `All` is the empty wildcard set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum DeviceFamily {
    All,
    IntelAll,
    NvidiaAll,
    AtiAll,
    MicrosoftAll,
    QualcommAll,
    AppleAll,
    IntelGMA500,
    IntelGMA950,
    IntelHDGraphicsToSandyBridge,
    IntelHaswell,
    Nvidia310M,
    Geforce7300GT,
    RadeonX1000,
    RadeonCaicos,
    AmdR600,
    Bug1137716,
    IntelWebRenderBlocked,
    NvidiaWebRenderBlocked,

    Max,
}

impl DeviceFamily {
    /// The shared set for this family.
    pub fn devices(self) -> Arc<DeviceSet> {
        static FAMILIES: OnceLock<Vec<Arc<DeviceSet>>> = OnceLock::new();
        FAMILIES.get_or_init(build_families)[self as usize].clone()
    }

    /// The vendor implied by the family, used to pre-fill the vendor
    /// predicate when a rule is built from a family.
    pub fn vendor(self) -> DeviceVendor {
        use DeviceFamily::*;
        match self {
            All | Max => DeviceVendor::All,
            IntelAll | IntelGMA500 | IntelGMA950 | IntelHDGraphicsToSandyBridge | IntelHaswell
            | IntelWebRenderBlocked => DeviceVendor::Intel,
            NvidiaAll | Nvidia310M | Geforce7300GT | NvidiaWebRenderBlocked => {
                DeviceVendor::Nvidia
            }
            AtiAll | RadeonX1000 | RadeonCaicos | AmdR600 | Bug1137716 => DeviceVendor::Ati,
            MicrosoftAll => DeviceVendor::Microsoft,
            QualcommAll => DeviceVendor::Qualcomm,
            AppleAll => DeviceVendor::Apple,
        }
    }
}

const ALL_FAMILIES: [DeviceFamily; DeviceFamily::Max as usize] = [
    DeviceFamily::All,
    DeviceFamily::IntelAll,
    DeviceFamily::NvidiaAll,
    DeviceFamily::AtiAll,
    DeviceFamily::MicrosoftAll,
    DeviceFamily::QualcommAll,
    DeviceFamily::AppleAll,
    DeviceFamily::IntelGMA500,
    DeviceFamily::IntelGMA950,
    DeviceFamily::IntelHDGraphicsToSandyBridge,
    DeviceFamily::IntelHaswell,
    DeviceFamily::Nvidia310M,
    DeviceFamily::Geforce7300GT,
    DeviceFamily::RadeonX1000,
    DeviceFamily::RadeonCaicos,
    DeviceFamily::AmdR600,
    DeviceFamily::Bug1137716,
    DeviceFamily::IntelWebRenderBlocked,
    DeviceFamily::NvidiaWebRenderBlocked,
];

/// Builds every family singleton. Runs once, before any concurrent reader
/// can observe a rule table.
fn build_families() -> Vec<Arc<DeviceSet>> {
    ALL_FAMILIES
        .iter()
        .map(|family| {
            let mut set = DeviceSet::new();
            populate(*family, &mut set);
            Arc::new(set)
        })
        .collect()
}

fn populate(family: DeviceFamily, set: &mut DeviceSet) {
    use DeviceFamily::*;
    // Vendor-wide families stay empty: combined with the vendor predicate
    // an empty set already means "every device of that vendor".
    match family {
        All | IntelAll | NvidiaAll | AtiAll | MicrosoftAll | QualcommAll | AppleAll | Max => {}
        IntelGMA500 => {
            set.add("0x8108"); // Poulsbo
            set.add("0x8109");
        }
        IntelGMA950 => {
            set.add("0x2772"); // Desktop
            set.add("0x27a2"); // Mobile
            set.add("0x27ae");
        }
        IntelHDGraphicsToSandyBridge => {
            set.add("0x0042");
            set.add("0x0046");
            set.add("0x0102");
            set.add("0x0106");
            set.add("0x0112");
            set.add("0x0116");
            set.add("0x0122");
            set.add("0x0126");
        }
        IntelHaswell => {
            set.add_range(0x0402, 0x042e);
            set.add_range(0x0a02, 0x0a2e);
            set.add_range(0x0d02, 0x0d26);
        }
        Nvidia310M => {
            set.add("0x0a75");
        }
        Geforce7300GT => {
            set.add("0x0393");
        }
        RadeonX1000 => {
            set.add("0x7187");
            set.add("0x7210");
            set.add("0x71de");
            set.add("0x7146");
            set.add("0x7142");
            set.add("0x7109");
            set.add("0x71c5");
            set.add("0x71c0");
            set.add("0x7240");
            set.add("0x7249");
            set.add("0x7291");
        }
        RadeonCaicos => {
            set.add("0x6766");
            set.add("0x6767");
            set.add("0x6768");
            set.add("0x6770");
            set.add("0x6771");
            set.add("0x6772");
            set.add("0x6778");
            set.add("0x6779");
            set.add("0x677b");
        }
        AmdR600 => {
            // R600 through Terascale 2, by id block.
            set.add_range(0x9400, 0x9442);
            set.add_range(0x9480, 0x94b5);
            set.add_range(0x9500, 0x9553);
            set.add_range(0x9580, 0x95c7);
            set.add_range(0x9600, 0x9617);
            set.add_range(0x9640, 0x964f);
            set.add_range(0x9680, 0x96bd);
        }
        Bug1137716 => {
            set.add("0x6720");
            set.add("0x6740");
            set.add("0x6741");
            set.add("0x6759");
            set.add("0x68b8");
            set.add("0x68d9");
            set.add("0x9498");
        }
        IntelWebRenderBlocked => {
            // Gen 7.5 mobile parts with known WR corruption.
            set.add("0x0155");
            set.add("0x0157");
            set.add_range(0x0f30, 0x0f33);
        }
        NvidiaWebRenderBlocked => {
            set.add("0x0407");
            set.add_range(0x06c0, 0x06cf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_matches_everything() {
        let set = DeviceSet::new();
        assert!(set.is_empty());
        assert!(set.contains("0x1234"));
        assert!(set.contains("anything"));
    }

    #[test]
    fn test_discrete_membership() {
        let mut set = DeviceSet::new();
        set.add("0x1234");
        assert!(set.contains("0x1234"));
        assert!(!set.contains("0x1235"));
        assert!(!set.is_empty());
    }

    #[test]
    fn test_range_membership_inclusive_both_ends() {
        let mut set = DeviceSet::new();
        set.add("0x1234");
        set.add_range(0x2000, 0x2010);
        assert!(set.contains("0x1234"));
        assert!(set.contains("0x2000"));
        assert!(set.contains("0x2005"));
        assert!(set.contains("0x2010"));
        assert!(!set.contains("0x2011"));
        assert!(!set.contains("0x3000"));
    }

    #[test]
    fn test_non_numeric_id_skips_range_test() {
        let mut set = DeviceSet::new();
        set.add_range(0, i64::MAX);
        assert!(!set.contains("not-a-number"));
    }

    #[test]
    fn test_decimal_ids_match_ranges() {
        let mut set = DeviceSet::new();
        set.add_range(100, 200);
        assert!(set.contains("150"));
        assert!(!set.contains("99"));
    }

    #[test]
    fn test_parse_device_id_forms() {
        assert_eq!(parse_device_id("0x2772"), Some(0x2772));
        assert_eq!(parse_device_id("0X2772"), Some(0x2772));
        assert_eq!(parse_device_id("10062"), Some(10062));
        assert_eq!(parse_device_id(" 0x2772 "), Some(0x2772));
        assert_eq!(parse_device_id("gma950"), None);
    }

    #[test]
    fn test_family_singletons_are_shared() {
        let a = DeviceFamily::IntelGMA950.devices();
        let b = DeviceFamily::IntelGMA950.devices();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_vendor_wide_families_are_wildcards() {
        assert!(DeviceFamily::All.devices().is_empty());
        assert!(DeviceFamily::IntelAll.devices().is_empty());
        assert!(DeviceFamily::NvidiaAll.devices().is_empty());
    }

    #[test]
    fn test_family_contents() {
        let gma950 = DeviceFamily::IntelGMA950.devices();
        assert!(gma950.contains("0x2772"));
        assert!(!gma950.contains("0x0042"));

        let haswell = DeviceFamily::IntelHaswell.devices();
        assert!(haswell.contains("0x0412"));
        assert!(!haswell.contains("0x0500"));

        let r600 = DeviceFamily::AmdR600.devices();
        assert!(r600.contains("0x9400"));
        assert!(r600.contains("0x95c7"));
        assert!(!r600.contains("0x9700"));
    }

    #[test]
    fn test_family_vendor_mapping() {
        assert_eq!(DeviceFamily::IntelGMA950.vendor(), DeviceVendor::Intel);
        assert_eq!(DeviceFamily::Nvidia310M.vendor(), DeviceVendor::Nvidia);
        assert_eq!(DeviceFamily::AmdR600.vendor(), DeviceVendor::Ati);
        assert_eq!(DeviceFamily::All.vendor(), DeviceVendor::All);
    }
}
