//! Blocklist rules: predicate enums, the [`Rule`] struct, and its builder.
//!
//! A rule pairs a predicate over environment attributes (OS, screen class,
//! battery, windowing protocol, vendors, device set, version or refresh-rate
//! bounds) with an outcome (feature, status, suggested driver version, rule
//! id). Wildcards are expressed per-field: `Unknown`/`All` enum variants and
//! empty strings match anything.
//!
//! Rules are authored through [`Rule::builder`], which enforces the
//! construction invariants (between-operators need both bounds, a rule
//! carries either a driver-version test or a refresh-rate test, never both).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::{DeviceFamily, DeviceSet};
use crate::version::{ComparisonOp, DriverVersion};

// ─────────────────────────────────────────────────────────────────────────────
// Predicate dimensions
// ─────────────────────────────────────────────────────────────────────────────

/// Operating system a rule applies to. `Unknown` is the wildcard; the bare
/// `Windows`/`MacOs` variants match every version of that family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingSystem {
    #[default]
    Unknown,
    Windows,
    Windows10,
    Windows11,
    MacOs,
    Linux,
    Android,
}

impl OperatingSystem {
    /// Whether a rule tagged `self` applies to an environment running `os`.
    pub fn matches(self, os: OperatingSystem) -> bool {
        use OperatingSystem::*;
        match self {
            Unknown => true,
            Windows => matches!(os, Windows | Windows10 | Windows11),
            other => other == os,
        }
    }
}

/// Concrete screen bucket an environment falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenSize {
    /// <= 1900x1200
    Small,
    /// <= 3440x1440
    Medium,
    /// > 3440x1440
    Large,
}

/// Screen bucket predicate carried by a rule; compound variants match
/// either of their constituent simple buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenSizeClass {
    #[default]
    All,
    Small,
    SmallAndMedium,
    Medium,
    MediumAndLarge,
    Large,
}

impl ScreenSizeClass {
    pub fn matches(self, size: ScreenSize) -> bool {
        use ScreenSizeClass::*;
        match self {
            All => true,
            Small => size == ScreenSize::Small,
            Medium => size == ScreenSize::Medium,
            Large => size == ScreenSize::Large,
            SmallAndMedium => size <= ScreenSize::Medium,
            MediumAndLarge => size >= ScreenSize::Medium,
        }
    }
}

/// Battery presence predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryStatus {
    #[default]
    All,
    Present,
    None,
}

impl BatteryStatus {
    pub fn matches(self, battery_present: bool) -> bool {
        match self {
            BatteryStatus::All => true,
            BatteryStatus::Present => battery_present,
            BatteryStatus::None => !battery_present,
        }
    }
}

/// Windowing protocols, with the compound `*All` buckets used on Linux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowProtocol {
    #[default]
    All,
    X11,
    XWayland,
    Wayland,
    WaylandDrm,
    /// Any Wayland flavor.
    WaylandAll,
    /// X11 proper or XWayland.
    X11All,
}

impl WindowProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            WindowProtocol::All => "",
            WindowProtocol::X11 => "x11",
            WindowProtocol::XWayland => "xwayland",
            WindowProtocol::Wayland => "wayland",
            WindowProtocol::WaylandDrm => "wayland/drm",
            WindowProtocol::WaylandAll => "wayland/all",
            WindowProtocol::X11All => "x11/all",
        }
    }
}

/// Case-sensitive protocol match with the compound-bucket expansions.
pub(crate) fn window_protocol_matches(rule: &str, env: &str) -> bool {
    match rule {
        "" => true,
        "wayland/all" => env.starts_with("wayland"),
        "x11/all" => env == "x11" || env == "xwayland",
        exact => env == exact,
    }
}

/// PCI device vendors known to the blocklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceVendor {
    #[default]
    All,
    Intel,
    Nvidia,
    Ati,
    Microsoft,
    Parallels,
    Qualcomm,
    Apple,
    Amazon,
}

impl DeviceVendor {
    /// PCI vendor id string, or empty for the wildcard.
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceVendor::All => "",
            DeviceVendor::Intel => "0x8086",
            DeviceVendor::Nvidia => "0x10de",
            DeviceVendor::Ati => "0x1002",
            DeviceVendor::Microsoft => "0x1414",
            DeviceVendor::Parallels => "0x1ab8",
            DeviceVendor::Qualcomm => "0x5143",
            DeviceVendor::Apple => "0x106b",
            DeviceVendor::Amazon => "0x1d0f",
        }
    }
}

/// Driver vendors (Linux driver stacks), with compound `*All` buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverVendor {
    #[default]
    All,
    MesaAll,
    MesaLlvmPipe,
    MesaSoftPipe,
    MesaSwRast,
    MesaVm,
    NonMesaAll,
}

impl DriverVendor {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverVendor::All => "",
            DriverVendor::MesaAll => "mesa/all",
            DriverVendor::MesaLlvmPipe => "mesa/llvmpipe",
            DriverVendor::MesaSoftPipe => "mesa/softpipe",
            DriverVendor::MesaSwRast => "mesa/swrast",
            DriverVendor::MesaVm => "mesa/vmwgfx",
            DriverVendor::NonMesaAll => "non-mesa/all",
        }
    }
}

/// Driver vendor match with the mesa/non-mesa bucket expansions.
pub(crate) fn driver_vendor_matches(rule: &str, env: &str) -> bool {
    match rule {
        "" => true,
        "mesa/all" => env.starts_with("mesa/"),
        "non-mesa/all" => !env.starts_with("mesa/"),
        exact => env == exact,
    }
}

/// Fixed versus variable refresh behavior of the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshRateStatus {
    #[default]
    Any,
    Fixed,
    Variable,
}

impl RefreshRateStatus {
    pub fn matches(self, status: RefreshRateStatus) -> bool {
        self == RefreshRateStatus::Any || self == status
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Features and outcomes
// ─────────────────────────────────────────────────────────────────────────────

/// Graphics capabilities gated by the blocklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Direct2d,
    Direct3d11Layers,
    Direct3d11Angle,
    HardwareVideoDecoding,
    Webgl,
    Webgl2,
    WebRender,
    WebRenderCompositor,
    CanvasRenderer,
    AcceleratedCanvas2d,
    VideoOverlay,
    DmaBuf,
    WebGpu,
}

impl Feature {
    pub const ALL: [Feature; 13] = [
        Feature::Direct2d,
        Feature::Direct3d11Layers,
        Feature::Direct3d11Angle,
        Feature::HardwareVideoDecoding,
        Feature::Webgl,
        Feature::Webgl2,
        Feature::WebRender,
        Feature::WebRenderCompositor,
        Feature::CanvasRenderer,
        Feature::AcceleratedCanvas2d,
        Feature::VideoOverlay,
        Feature::DmaBuf,
        Feature::WebGpu,
    ];

    /// Features that are only ever allowed on known-good configurations.
    /// These are exempt from `RuleFeature::Optional` blanket rules: a
    /// blanket rule exists to catch the long tail, while these features
    /// already default to off unless an allowlist turned them on.
    pub fn only_allowed_on_known_config(self) -> bool {
        matches!(
            self,
            Feature::Direct2d | Feature::Direct3d11Layers | Feature::HardwareVideoDecoding
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::Direct2d => "direct2d",
            Feature::Direct3d11Layers => "direct3d11_layers",
            Feature::Direct3d11Angle => "direct3d11_angle",
            Feature::HardwareVideoDecoding => "hardware_video_decoding",
            Feature::Webgl => "webgl",
            Feature::Webgl2 => "webgl2",
            Feature::WebRender => "web_render",
            Feature::WebRenderCompositor => "web_render_compositor",
            Feature::CanvasRenderer => "canvas_renderer",
            Feature::AcceleratedCanvas2d => "accelerated_canvas2d",
            Feature::VideoOverlay => "video_overlay",
            Feature::DmaBuf => "dma_buf",
            Feature::WebGpu => "web_gpu",
        }
    }

    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.iter().copied().find(|f| f.as_str() == name)
    }
}

/// The feature slot of a rule: a concrete feature or one of the two
/// wildcard sentinels. The two-sentinel scheme is deliberate — `Optional`
/// exempts the known-config-only features from a blanket rule, `All`
/// really does mean all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleFeature {
    /// Every feature.
    All,
    /// Every feature except those `only_allowed_on_known_config`.
    #[default]
    Optional,
    Specific(Feature),
}

impl RuleFeature {
    /// Feature gate used by the evaluator before predicate matching.
    pub fn covers(self, feature: Feature) -> bool {
        match self {
            RuleFeature::All => true,
            RuleFeature::Optional => !feature.only_allowed_on_known_config(),
            RuleFeature::Specific(f) => f == feature,
        }
    }

    pub fn from_name(name: &str) -> Option<RuleFeature> {
        match name {
            "all" => Some(RuleFeature::All),
            "optional" => Some(RuleFeature::Optional),
            other => Feature::from_name(other).map(RuleFeature::Specific),
        }
    }
}

/// Outcome code attached to a matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    /// Feature works; no blocklist interference.
    #[default]
    Ok,
    /// Known good, may skip qualification checks.
    AllowAlways,
    /// Allowed but only because it qualified, not known-perfect.
    AllowQualified,
    /// Works but with bad enough issues that it is not recommended.
    Discouraged,
    /// Blocked because of the reported driver version.
    BlockedDriverVersion,
    /// Blocked for this device outright.
    BlockedDevice,
    /// Blocked on this OS version.
    BlockedOsVersion,
    /// Blocked because registry and DLL driver versions disagree.
    BlockedMismatchedVersion,
    /// Blocked by policy regardless of hardware.
    Denied,
}

impl FeatureStatus {
    /// True for every status that turns the feature off or warns against it.
    pub fn is_failure(self) -> bool {
        !matches!(
            self,
            FeatureStatus::Ok | FeatureStatus::AllowAlways | FeatureStatus::AllowQualified
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rule
// ─────────────────────────────────────────────────────────────────────────────

/// The version-or-refresh-rate half of a rule's predicate. A rule carries
/// exactly one of the two kinds.
#[derive(Debug, Clone)]
pub enum RangePredicate {
    /// Test the parsed driver version. `max` only meaningful for the
    /// `Between*` operators.
    DriverVersion {
        op: ComparisonOp,
        min: DriverVersion,
        max: Option<DriverVersion>,
    },
    /// Test the display's refresh-rate envelope instead.
    RefreshRate {
        status: RefreshRateStatus,
        min_op: ComparisonOp,
        min: u32,
        min_max: u32,
        max_op: ComparisonOp,
        max: u32,
        max_max: u32,
    },
}

impl Default for RangePredicate {
    fn default() -> Self {
        RangePredicate::DriverVersion {
            op: ComparisonOp::Ignored,
            min: DriverVersion::ALL,
            max: None,
        }
    }
}

/// One blocklist entry. Built via [`Rule::builder`]; immutable afterwards.
#[derive(Debug, Clone)]
pub struct Rule {
    pub os: OperatingSystem,
    pub os_version_op: ComparisonOp,
    pub os_version_min: DriverVersion,
    pub os_version_max: Option<DriverVersion>,
    pub screen: ScreenSizeClass,
    pub battery: BatteryStatus,
    /// Empty = wildcard. Compound buckets ("wayland/all") expand.
    pub window_protocol: String,
    /// PCI vendor id string; empty = wildcard.
    pub device_vendor: String,
    /// Driver stack string; empty = wildcard.
    pub driver_vendor: String,
    pub devices: Arc<DeviceSet>,
    pub feature: RuleFeature,
    pub status: FeatureStatus,
    pub range: RangePredicate,
    pub suggested_version: Option<String>,
    /// Stable diagnostic identifier ("FEATURE_FAILURE_BUG_1137716").
    pub rule_id: String,
    /// Rule only applies to queries about the secondary adapter.
    pub gpu2: bool,
}

impl Rule {
    pub fn builder(rule_id: impl Into<String>) -> RuleBuilder {
        RuleBuilder {
            rule: Rule {
                os: OperatingSystem::Unknown,
                os_version_op: ComparisonOp::Ignored,
                os_version_min: DriverVersion::ALL,
                os_version_max: None,
                screen: ScreenSizeClass::All,
                battery: BatteryStatus::All,
                window_protocol: String::new(),
                device_vendor: String::new(),
                driver_vendor: String::new(),
                devices: DeviceFamily::All.devices(),
                feature: RuleFeature::Optional,
                status: FeatureStatus::Ok,
                range: RangePredicate::default(),
                suggested_version: None,
                rule_id: rule_id.into(),
                gpu2: false,
            },
            has_driver_version: false,
            has_refresh_rate: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Construction
// ─────────────────────────────────────────────────────────────────────────────

/// A rule that violates a construction invariant. These are table-authoring
/// bugs: the table builder asserts in debug builds and drops the rule with
/// a warning in release.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("rule {rule_id}: {op:?} needs both a lower and an upper bound")]
    MissingUpperBound { rule_id: String, op: ComparisonOp },
    #[error("rule {rule_id}: upper bound given for non-between operator {op:?}")]
    UnexpectedUpperBound { rule_id: String, op: ComparisonOp },
    #[error("rule {rule_id}: driver-version and refresh-rate predicates are mutually exclusive")]
    ConflictingPredicates { rule_id: String },
    #[error("rule {rule_id}: bad version bound: {source}")]
    InvalidVersion {
        rule_id: String,
        #[source]
        source: crate::version::ParseError,
    },
    #[error("rule {rule_id}: unknown feature {name:?}")]
    UnknownFeature { rule_id: String, name: String },
}

/// Fluent construction for [`Rule`]. Field order mirrors the predicate
/// evaluation order; every setter is optional and defaults to a wildcard.
pub struct RuleBuilder {
    rule: Rule,
    has_driver_version: bool,
    has_refresh_rate: bool,
}

impl RuleBuilder {
    pub fn os(mut self, os: OperatingSystem) -> Self {
        self.rule.os = os;
        self
    }

    /// Bounds the host OS build version (not the driver).
    pub fn os_version(mut self, op: ComparisonOp, min: DriverVersion) -> Self {
        self.rule.os_version_op = op;
        self.rule.os_version_min = min;
        self
    }

    pub fn os_version_between(
        mut self,
        op: ComparisonOp,
        min: DriverVersion,
        max: DriverVersion,
    ) -> Self {
        self.rule.os_version_op = op;
        self.rule.os_version_min = min;
        self.rule.os_version_max = Some(max);
        self
    }

    pub fn screen(mut self, screen: ScreenSizeClass) -> Self {
        self.rule.screen = screen;
        self
    }

    pub fn battery(mut self, battery: BatteryStatus) -> Self {
        self.rule.battery = battery;
        self
    }

    pub fn window_protocol(mut self, protocol: WindowProtocol) -> Self {
        self.rule.window_protocol = protocol.as_str().to_string();
        self
    }

    /// Raw protocol string, for rules loaded from configuration.
    pub fn window_protocol_str(mut self, protocol: impl Into<String>) -> Self {
        self.rule.window_protocol = protocol.into();
        self
    }

    /// Device family predicate. Also pre-fills the vendor predicate from
    /// the family unless one was set explicitly.
    pub fn devices(mut self, family: DeviceFamily) -> Self {
        self.rule.devices = family.devices();
        if self.rule.device_vendor.is_empty() {
            self.rule.device_vendor = family.vendor().as_str().to_string();
        }
        self
    }

    /// Explicit device set, for rules loaded from configuration.
    pub fn device_set(mut self, devices: Arc<DeviceSet>) -> Self {
        self.rule.devices = devices;
        self
    }

    pub fn device_vendor(mut self, vendor: DeviceVendor) -> Self {
        self.rule.device_vendor = vendor.as_str().to_string();
        self
    }

    pub fn device_vendor_str(mut self, vendor: impl Into<String>) -> Self {
        self.rule.device_vendor = vendor.into();
        self
    }

    pub fn driver_vendor(mut self, vendor: DriverVendor) -> Self {
        self.rule.driver_vendor = vendor.as_str().to_string();
        self
    }

    pub fn driver_vendor_str(mut self, vendor: impl Into<String>) -> Self {
        self.rule.driver_vendor = vendor.into();
        self
    }

    pub fn feature(mut self, feature: Feature) -> Self {
        self.rule.feature = RuleFeature::Specific(feature);
        self
    }

    pub fn features(mut self, features: RuleFeature) -> Self {
        self.rule.feature = features;
        self
    }

    pub fn status(mut self, status: FeatureStatus) -> Self {
        self.rule.status = status;
        self
    }

    /// Single-bound driver version test.
    pub fn driver_version(mut self, op: ComparisonOp, min: DriverVersion) -> Self {
        self.rule.range = RangePredicate::DriverVersion { op, min, max: None };
        self.has_driver_version = true;
        self
    }

    /// Two-bound driver version test; `op` must be a `Between*` variant.
    pub fn driver_version_between(
        mut self,
        op: ComparisonOp,
        min: DriverVersion,
        max: DriverVersion,
    ) -> Self {
        self.rule.range = RangePredicate::DriverVersion {
            op,
            min,
            max: Some(max),
        };
        self.has_driver_version = true;
        self
    }

    /// Refresh-rate test; mutually exclusive with any driver-version test.
    #[allow(clippy::too_many_arguments)]
    pub fn refresh_rate(
        mut self,
        status: RefreshRateStatus,
        min_op: ComparisonOp,
        min: u32,
        min_max: u32,
        max_op: ComparisonOp,
        max: u32,
        max_max: u32,
    ) -> Self {
        self.rule.range = RangePredicate::RefreshRate {
            status,
            min_op,
            min,
            min_max,
            max_op,
            max,
            max_max,
        };
        self.has_refresh_rate = true;
        self
    }

    pub fn suggested_version(mut self, version: impl Into<String>) -> Self {
        self.rule.suggested_version = Some(version.into());
        self
    }

    pub fn gpu2(mut self) -> Self {
        self.rule.gpu2 = true;
        self
    }

    /// Validates the construction invariants and yields the rule.
    pub fn build(self) -> Result<Rule, ConstructionError> {
        let rule = self.rule;

        if self.has_driver_version && self.has_refresh_rate {
            return Err(ConstructionError::ConflictingPredicates {
                rule_id: rule.rule_id,
            });
        }

        if let RangePredicate::DriverVersion { op, max, .. } = &rule.range {
            if op.needs_upper_bound() && max.is_none() {
                return Err(ConstructionError::MissingUpperBound {
                    rule_id: rule.rule_id,
                    op: *op,
                });
            }
            if !op.needs_upper_bound() && *op != ComparisonOp::Ignored && max.is_some() {
                return Err(ConstructionError::UnexpectedUpperBound {
                    rule_id: rule.rule_id,
                    op: *op,
                });
            }
        }

        if rule.os_version_op.needs_upper_bound() && rule.os_version_max.is_none() {
            return Err(ConstructionError::MissingUpperBound {
                rule_id: rule.rule_id,
                op: rule.os_version_op,
            });
        }

        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionPadding;

    fn v(a: u16, b: u16, c: u16, d: u16) -> DriverVersion {
        DriverVersion::from_parts(a, b, c, d)
    }

    #[test]
    fn test_os_wildcard_and_family_match() {
        assert!(OperatingSystem::Unknown.matches(OperatingSystem::Linux));
        assert!(OperatingSystem::Windows.matches(OperatingSystem::Windows10));
        assert!(OperatingSystem::Windows.matches(OperatingSystem::Windows11));
        assert!(!OperatingSystem::Windows10.matches(OperatingSystem::Windows11));
        assert!(!OperatingSystem::Windows.matches(OperatingSystem::Linux));
    }

    #[test]
    fn test_screen_class_compound_buckets() {
        assert!(ScreenSizeClass::SmallAndMedium.matches(ScreenSize::Small));
        assert!(ScreenSizeClass::SmallAndMedium.matches(ScreenSize::Medium));
        assert!(!ScreenSizeClass::SmallAndMedium.matches(ScreenSize::Large));
        assert!(ScreenSizeClass::MediumAndLarge.matches(ScreenSize::Large));
        assert!(!ScreenSizeClass::MediumAndLarge.matches(ScreenSize::Small));
        assert!(ScreenSizeClass::All.matches(ScreenSize::Large));
    }

    #[test]
    fn test_battery_predicate() {
        assert!(BatteryStatus::All.matches(true));
        assert!(BatteryStatus::All.matches(false));
        assert!(BatteryStatus::Present.matches(true));
        assert!(!BatteryStatus::Present.matches(false));
        assert!(BatteryStatus::None.matches(false));
        assert!(!BatteryStatus::None.matches(true));
    }

    #[test]
    fn test_window_protocol_buckets() {
        assert!(window_protocol_matches("", "x11"));
        assert!(window_protocol_matches("wayland", "wayland"));
        assert!(!window_protocol_matches("wayland", "x11"));
        assert!(window_protocol_matches("wayland/all", "wayland"));
        assert!(window_protocol_matches("wayland/all", "wayland/drm"));
        assert!(!window_protocol_matches("wayland/all", "x11"));
        assert!(window_protocol_matches("x11/all", "x11"));
        assert!(window_protocol_matches("x11/all", "xwayland"));
        assert!(!window_protocol_matches("x11/all", "wayland"));
    }

    #[test]
    fn test_driver_vendor_buckets() {
        assert!(driver_vendor_matches("", "mesa/i965"));
        assert!(driver_vendor_matches("mesa/all", "mesa/i965"));
        assert!(!driver_vendor_matches("mesa/all", "nvidia/unknown"));
        assert!(driver_vendor_matches("non-mesa/all", "nvidia/unknown"));
        assert!(!driver_vendor_matches("non-mesa/all", "mesa/llvmpipe"));
        assert!(driver_vendor_matches("mesa/llvmpipe", "mesa/llvmpipe"));
    }

    #[test]
    fn test_rule_feature_two_sentinels() {
        assert!(RuleFeature::All.covers(Feature::Direct2d));
        assert!(RuleFeature::All.covers(Feature::WebRender));
        // Optional exempts the known-config-only features.
        assert!(!RuleFeature::Optional.covers(Feature::Direct2d));
        assert!(RuleFeature::Optional.covers(Feature::WebRender));
        assert!(RuleFeature::Specific(Feature::Webgl).covers(Feature::Webgl));
        assert!(!RuleFeature::Specific(Feature::Webgl).covers(Feature::Webgl2));
    }

    #[test]
    fn test_feature_name_roundtrip() {
        for feature in Feature::ALL {
            assert_eq!(Feature::from_name(feature.as_str()), Some(feature));
        }
        assert_eq!(RuleFeature::from_name("all"), Some(RuleFeature::All));
        assert_eq!(RuleFeature::from_name("optional"), Some(RuleFeature::Optional));
        assert_eq!(
            RuleFeature::from_name("webgl"),
            Some(RuleFeature::Specific(Feature::Webgl))
        );
        assert_eq!(RuleFeature::from_name("nope"), None);
    }

    #[test]
    fn test_status_failure_classification() {
        assert!(!FeatureStatus::Ok.is_failure());
        assert!(!FeatureStatus::AllowAlways.is_failure());
        assert!(!FeatureStatus::AllowQualified.is_failure());
        assert!(FeatureStatus::Discouraged.is_failure());
        assert!(FeatureStatus::BlockedDriverVersion.is_failure());
        assert!(FeatureStatus::Denied.is_failure());
    }

    #[test]
    fn test_builder_defaults_are_wildcards() {
        let rule = Rule::builder("TEST_DEFAULTS").build().unwrap();
        assert_eq!(rule.os, OperatingSystem::Unknown);
        assert_eq!(rule.screen, ScreenSizeClass::All);
        assert_eq!(rule.battery, BatteryStatus::All);
        assert!(rule.window_protocol.is_empty());
        assert!(rule.device_vendor.is_empty());
        assert!(rule.devices.is_empty());
        assert!(!rule.gpu2);
        assert!(matches!(
            rule.range,
            RangePredicate::DriverVersion {
                op: ComparisonOp::Ignored,
                ..
            }
        ));
    }

    #[test]
    fn test_builder_family_sets_vendor() {
        let rule = Rule::builder("TEST_FAMILY_VENDOR")
            .devices(DeviceFamily::IntelGMA950)
            .build()
            .unwrap();
        assert_eq!(rule.device_vendor, DeviceVendor::Intel.as_str());
        assert!(rule.devices.contains("0x2772"));
    }

    #[test]
    fn test_builder_explicit_vendor_survives_family() {
        let rule = Rule::builder("TEST_VENDOR_KEPT")
            .device_vendor(DeviceVendor::Nvidia)
            .devices(DeviceFamily::IntelGMA950)
            .build()
            .unwrap();
        assert_eq!(rule.device_vendor, DeviceVendor::Nvidia.as_str());
    }

    #[test]
    fn test_builder_rejects_between_without_upper_bound() {
        let err = Rule::builder("TEST_NO_UPPER")
            .driver_version(ComparisonOp::BetweenInclusive, v(1, 0, 0, 0))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConstructionError::MissingUpperBound { .. }));
    }

    #[test]
    fn test_builder_rejects_conflicting_predicates() {
        let err = Rule::builder("TEST_CONFLICT")
            .driver_version(ComparisonOp::LessThan, v(1, 0, 0, 0))
            .refresh_rate(
                RefreshRateStatus::Any,
                ComparisonOp::GreaterThan,
                120,
                0,
                ComparisonOp::Ignored,
                0,
                0,
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, ConstructionError::ConflictingPredicates { .. }));
    }

    #[test]
    fn test_builder_accepts_between_with_bounds() {
        let rule = Rule::builder("TEST_BETWEEN")
            .driver_version_between(
                ComparisonOp::BetweenInclusiveStart,
                v(8, 15, 10, 0),
                v(8, 15, 10, 2202),
            )
            .build()
            .unwrap();
        match rule.range {
            RangePredicate::DriverVersion { op, min, max } => {
                assert_eq!(op, ComparisonOp::BetweenInclusiveStart);
                assert_eq!(min, v(8, 15, 10, 0));
                assert_eq!(max, Some(v(8, 15, 10, 2202)));
            }
            _ => panic!("expected a driver-version predicate"),
        }
    }

    #[test]
    fn test_builder_os_version_bound() {
        let build = DriverVersion::parse("10.0.19043", VersionPadding::None).unwrap();
        let rule = Rule::builder("TEST_OS_VERSION")
            .os(OperatingSystem::Windows10)
            .os_version(ComparisonOp::LessThan, build)
            .build()
            .unwrap();
        assert_eq!(rule.os_version_op, ComparisonOp::LessThan);
        assert_eq!(rule.os_version_min, build);
    }
}
