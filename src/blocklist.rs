//! The built-in blocklist: the static rule table shipped with the crate.
//!
//! Entries are ordered specific-before-general per feature, because the
//! evaluator stops at the first match. Each rule carries a stable id used
//! in diagnostics; ids reference the bug that motivated the entry where
//! one exists.
//!
//! The built-in table is published once behind a `OnceLock` and shared by
//! every caller; deployments that need extra rules build their own table
//! via [`build_table`] and keep the reference themselves.

use std::sync::OnceLock;

use crate::config::Config;
use crate::device::DeviceFamily;
use crate::rule::{
    BatteryStatus, DriverVendor, Feature, FeatureStatus, OperatingSystem, RefreshRateStatus,
    Rule, RuleFeature, ScreenSizeClass, WindowProtocol,
};
use crate::table::{RuleTable, RuleTableBuilder};
use crate::version::{ComparisonOp, DriverVersion, VersionPadding};

/// The process-wide built-in table, built with the platform's padding
/// policy on first use.
pub fn builtin_table() -> &'static RuleTable {
    static TABLE: OnceLock<RuleTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let padding = VersionPadding::platform_default();
        let mut builder = RuleTable::builder(padding);
        append_builtin_rules(&mut builder, padding);
        builder.freeze()
    })
}

/// Builds a fresh table from the configuration: built-in rules first, then
/// any locally supplied extras. Callers own the result; swapping to a new
/// table is the only supported way to change the rule set at runtime.
pub fn build_table(config: &Config) -> RuleTable {
    let padding = config.engine.padding();
    let mut builder = RuleTable::builder(padding);
    append_builtin_rules(&mut builder, padding);
    for entry in &config.rules {
        builder.push(entry.to_rule(padding));
    }
    builder.freeze()
}

fn append_builtin_rules(builder: &mut RuleTableBuilder, padding: VersionPadding) {
    let v = |a, b, c, d| DriverVersion::from_parts_padded(a, b, c, d, padding);
    let raw = |a, b, c, d| DriverVersion::from_parts(a, b, c, d);

    // ── Windows ────────────────────────────────────────────────────────

    // Pre-D3D9 Intel IGPs hang the compositor no matter the driver.
    builder.push(
        Rule::builder("FEATURE_FAILURE_INTEL_GMA500")
            .os(OperatingSystem::Windows)
            .devices(DeviceFamily::IntelGMA500)
            .features(RuleFeature::All)
            .status(FeatureStatus::BlockedDevice)
            .build(),
    );

    builder.push(
        Rule::builder("FEATURE_FAILURE_INTEL_GMA950_D2D")
            .os(OperatingSystem::Windows)
            .devices(DeviceFamily::IntelGMA950)
            .feature(Feature::Direct2d)
            .status(FeatureStatus::BlockedDriverVersion)
            .driver_version(ComparisonOp::LessThan, v(8, 15, 10, 2202))
            .suggested_version("8.15.10.2202")
            .build(),
    );

    // Sandy Bridge era driver range with known D3D11 ANGLE crashes.
    builder.push(
        Rule::builder("FEATURE_FAILURE_INTEL_SNB_ANGLE_RANGE")
            .os(OperatingSystem::Windows)
            .devices(DeviceFamily::IntelHDGraphicsToSandyBridge)
            .feature(Feature::Direct3d11Angle)
            .status(FeatureStatus::BlockedDriverVersion)
            .driver_version_between(
                ComparisonOp::BetweenInclusiveStart,
                v(8, 15, 10, 2321),
                v(8, 15, 10, 2418),
            )
            .suggested_version("8.15.10.2418")
            .build(),
    );

    builder.push(
        Rule::builder("FEATURE_FAILURE_NV310M_WEBGL")
            .os(OperatingSystem::Windows)
            .devices(DeviceFamily::Nvidia310M)
            .feature(Feature::Webgl)
            .status(FeatureStatus::BlockedDevice)
            .build(),
    );

    builder.push(
        Rule::builder("FEATURE_FAILURE_RADEON_X1000_D3D11")
            .os(OperatingSystem::Windows)
            .devices(DeviceFamily::RadeonX1000)
            .feature(Feature::Direct3d11Layers)
            .status(FeatureStatus::BlockedDevice)
            .build(),
    );

    // Video overlays misrender on pre-1809 builds of Windows 10.
    builder.push(
        Rule::builder("FEATURE_FAILURE_OVERLAY_OLD_WIN10")
            .os(OperatingSystem::Windows10)
            .os_version(ComparisonOp::LessThan, raw(10, 0, 17763, 0))
            .feature(Feature::VideoOverlay)
            .status(FeatureStatus::BlockedOsVersion)
            .build(),
    );

    // Discrete NVIDIA as the second adapter of an Optimus pair: broken
    // surface sharing in this driver series.
    builder.push(
        Rule::builder("FEATURE_FAILURE_GPU2_NV_SURFACE_SHARING")
            .os(OperatingSystem::Windows)
            .devices(DeviceFamily::NvidiaAll)
            .feature(Feature::Direct3d11Angle)
            .status(FeatureStatus::BlockedDriverVersion)
            .driver_version_between(
                ComparisonOp::BetweenInclusive,
                v(21, 21, 13, 7000),
                v(21, 21, 13, 7892),
            )
            .gpu2()
            .build(),
    );

    // Hardware decoding drains small laptops on battery; discourage it.
    builder.push(
        Rule::builder("FEATURE_ROLLOUT_HW_DECODE_BATTERY_SMALL")
            .os(OperatingSystem::Windows)
            .screen(ScreenSizeClass::Small)
            .battery(BatteryStatus::Present)
            .feature(Feature::HardwareVideoDecoding)
            .status(FeatureStatus::Discouraged)
            .build(),
    );

    // ── macOS ──────────────────────────────────────────────────────────

    builder.push(
        Rule::builder("FEATURE_FAILURE_MAC_7300GT_WEBGL")
            .os(OperatingSystem::MacOs)
            .devices(DeviceFamily::Geforce7300GT)
            .feature(Feature::Webgl)
            .status(FeatureStatus::BlockedDevice)
            .build(),
    );

    // ── Linux ──────────────────────────────────────────────────────────

    // Mesa before 17.0 lacks the GL extensions the renderer assumes.
    builder.push(
        Rule::builder("FEATURE_FAILURE_OLD_MESA")
            .os(OperatingSystem::Linux)
            .driver_vendor(DriverVendor::MesaAll)
            .features(RuleFeature::Optional)
            .status(FeatureStatus::BlockedDriverVersion)
            .driver_version(ComparisonOp::LessThan, raw(17, 0, 0, 0))
            .suggested_version("17.0")
            .build(),
    );

    builder.push(
        Rule::builder("FEATURE_FAILURE_SOFTWARE_GL")
            .os(OperatingSystem::Linux)
            .driver_vendor(DriverVendor::MesaLlvmPipe)
            .feature(Feature::WebRender)
            .status(FeatureStatus::Discouraged)
            .build(),
    );

    builder.push(
        Rule::builder("FEATURE_FAILURE_AMD_R600_WR")
            .os(OperatingSystem::Linux)
            .devices(DeviceFamily::AmdR600)
            .feature(Feature::WebRender)
            .status(FeatureStatus::BlockedDevice)
            .build(),
    );

    builder.push(
        Rule::builder("FEATURE_FAILURE_WR_INTEL_GEN75")
            .devices(DeviceFamily::IntelWebRenderBlocked)
            .feature(Feature::WebRender)
            .status(FeatureStatus::BlockedDevice)
            .build(),
    );

    builder.push(
        Rule::builder("FEATURE_FAILURE_WR_NV_TESLA")
            .devices(DeviceFamily::NvidiaWebRenderBlocked)
            .feature(Feature::WebRender)
            .status(FeatureStatus::BlockedDevice)
            .build(),
    );

    // Proprietary NVIDIA gained usable DMA-BUF export in 495.
    builder.push(
        Rule::builder("FEATURE_FAILURE_NV_DMABUF_WAYLAND")
            .os(OperatingSystem::Linux)
            .window_protocol(WindowProtocol::WaylandAll)
            .devices(DeviceFamily::NvidiaAll)
            .driver_vendor(DriverVendor::NonMesaAll)
            .feature(Feature::DmaBuf)
            .status(FeatureStatus::BlockedDriverVersion)
            .driver_version(ComparisonOp::LessThan, raw(495, 44, 0, 0))
            .suggested_version("495.44")
            .build(),
    );

    // Compositing glitches on variable-refresh panels above 120 Hz.
    builder.push(
        Rule::builder("FEATURE_FAILURE_VRR_HIGH_REFRESH_OVERLAY")
            .os(OperatingSystem::Linux)
            .refresh_rate(
                RefreshRateStatus::Variable,
                ComparisonOp::Ignored,
                0,
                0,
                ComparisonOp::GreaterThan,
                120,
                0,
            )
            .feature(Feature::VideoOverlay)
            .status(FeatureStatus::Discouraged)
            .build(),
    );

    // ── Android ────────────────────────────────────────────────────────

    builder.push(
        Rule::builder("FEATURE_FAILURE_ADRENO_CANVAS")
            .os(OperatingSystem::Android)
            .devices(DeviceFamily::QualcommAll)
            .feature(Feature::AcceleratedCanvas2d)
            .status(FeatureStatus::BlockedDriverVersion)
            .driver_version(ComparisonOp::LessThanOrEqual, raw(331, 0, 0, 0))
            .build(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::rule::DeviceVendor;

    #[test]
    fn test_builtin_table_builds_without_invalid_rules() {
        // A construction error would have tripped the debug assertion in
        // RuleTableBuilder::push.
        let table = builtin_table();
        assert!(table.len() >= 15);
    }

    #[test]
    fn test_builtin_table_is_shared() {
        assert!(std::ptr::eq(builtin_table(), builtin_table()));
    }

    #[test]
    fn test_gma500_blocks_everything_on_windows() {
        let table = builtin_table();
        let env = Environment {
            os: OperatingSystem::Windows10,
            device_vendor: DeviceVendor::Intel.as_str().to_string(),
            device_id: "0x8108".to_string(),
            driver_version: "6.14.11.1044".to_string(),
            ..Environment::default()
        };
        for feature in Feature::ALL {
            let decision = table.evaluate(&env, feature, FeatureStatus::Ok);
            assert_eq!(
                decision.rule_id.as_deref(),
                Some("FEATURE_FAILURE_INTEL_GMA500"),
                "{feature:?} should be blocked on GMA500"
            );
        }
    }

    #[test]
    fn test_old_mesa_blocks_optional_features_only() {
        let table = builtin_table();
        let env = Environment {
            os: OperatingSystem::Linux,
            driver_vendor: "mesa/i965".to_string(),
            driver_version: "13.0.6".to_string(),
            ..Environment::default()
        };

        let decision = table.evaluate(&env, Feature::WebRender, FeatureStatus::Ok);
        assert_eq!(decision.status, FeatureStatus::BlockedDriverVersion);
        assert_eq!(decision.suggested_version.as_deref(), Some("17.0"));

        // Known-config-only features are exempt from the optional sentinel.
        let decision = table.evaluate(&env, Feature::HardwareVideoDecoding, FeatureStatus::Ok);
        assert_eq!(decision.status, FeatureStatus::Ok);
    }

    #[test]
    fn test_new_mesa_is_clean() {
        let table = builtin_table();
        let env = Environment {
            os: OperatingSystem::Linux,
            driver_vendor: "mesa/i965".to_string(),
            driver_version: "21.2.1".to_string(),
            ..Environment::default()
        };
        let decision = table.evaluate(&env, Feature::WebRender, FeatureStatus::Ok);
        assert_eq!(decision.status, FeatureStatus::Ok);
        assert!(decision.rule_id.is_none());
    }

    #[test]
    fn test_nvidia_dmabuf_wayland_rule() {
        let table = builtin_table();
        let mut env = Environment {
            os: OperatingSystem::Linux,
            window_protocol: "wayland".to_string(),
            device_vendor: DeviceVendor::Nvidia.as_str().to_string(),
            device_id: "0x2204".to_string(),
            driver_vendor: "non-mesa/nvidia".to_string(),
            driver_version: "470.86".to_string(),
            ..Environment::default()
        };
        let decision = table.evaluate(&env, Feature::DmaBuf, FeatureStatus::Ok);
        assert_eq!(decision.status, FeatureStatus::BlockedDriverVersion);
        assert_eq!(decision.suggested_version.as_deref(), Some("495.44"));

        env.driver_version = "510.47.3".to_string();
        let decision = table.evaluate(&env, Feature::DmaBuf, FeatureStatus::Ok);
        assert_eq!(decision.status, FeatureStatus::Ok);

        // Same driver on X11 is out of scope for the rule.
        env.driver_version = "470.86".to_string();
        env.window_protocol = "x11".to_string();
        let decision = table.evaluate(&env, Feature::DmaBuf, FeatureStatus::Ok);
        assert_eq!(decision.status, FeatureStatus::Ok);
    }

    #[test]
    fn test_build_table_appends_config_rules() {
        use crate::config::{Config, RuleEntry};

        let mut config = Config::default();
        config.rules.push(RuleEntry {
            id: "LOCAL_TEST_RULE".to_string(),
            feature: "webgl".to_string(),
            status: FeatureStatus::Denied,
            devices: vec!["0x9999".to_string()],
            ..RuleEntry::default()
        });

        let table = build_table(&config);
        assert_eq!(table.len(), builtin_table().len() + 1);

        let env = Environment {
            device_id: "0x9999".to_string(),
            driver_version: "1.0".to_string(),
            ..Environment::default()
        };
        let decision = table.evaluate(&env, Feature::Webgl, FeatureStatus::Ok);
        assert_eq!(decision.rule_id.as_deref(), Some("LOCAL_TEST_RULE"));
        assert_eq!(decision.status, FeatureStatus::Denied);
    }
}
