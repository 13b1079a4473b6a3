//! The runtime environment snapshot evaluated against the rule table.
//!
//! An [`Environment`] is assembled by whatever probes the OS and GPU; this
//! crate only consumes it. It describes exactly one adapter — for dual-GPU
//! systems the caller builds a second snapshot with `secondary_gpu` set and
//! queries again. Deserializable so the CLI can evaluate captured snapshots
//! from a TOML file.

use serde::{Deserialize, Serialize};

use crate::rule::{OperatingSystem, RefreshRateStatus, ScreenSize};

/// Immutable description of one adapter and its surroundings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    pub os: OperatingSystem,
    /// Host OS build version ("10.0.19043"), parsed without the decimal
    /// padding quirk.
    pub os_version: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub battery_present: bool,
    /// Windowing protocol name ("x11", "wayland", "wayland/drm", ...).
    pub window_protocol: String,
    /// PCI vendor id string ("0x8086").
    pub device_vendor: String,
    /// PCI device id string ("0x2772").
    pub device_id: String,
    /// Driver stack string ("mesa/i965", "non-mesa/unknown", ...).
    pub driver_vendor: String,
    /// Vendor-reported driver version string, possibly garbage.
    pub driver_version: String,
    pub refresh_rate_status: RefreshRateStatus,
    pub min_refresh_rate: u32,
    pub max_refresh_rate: u32,
    /// This snapshot describes the secondary adapter of a dual-GPU system.
    pub secondary_gpu: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            os: OperatingSystem::Unknown,
            os_version: String::new(),
            screen_width: 0,
            screen_height: 0,
            battery_present: false,
            window_protocol: String::new(),
            device_vendor: String::new(),
            device_id: String::new(),
            driver_vendor: String::new(),
            driver_version: String::new(),
            refresh_rate_status: RefreshRateStatus::Any,
            min_refresh_rate: 0,
            max_refresh_rate: 0,
            secondary_gpu: false,
        }
    }
}

impl Environment {
    /// Maps the pixel dimensions to a screen bucket.
    ///
    /// Small is anything up to 1900x1200 (WUXGA), Medium up to 3440x1440
    /// (ultrawide QHD), Large beyond that.
    pub fn screen_size(&self) -> ScreenSize {
        if self.screen_width <= 1900 && self.screen_height <= 1200 {
            ScreenSize::Small
        } else if self.screen_width <= 3440 && self.screen_height <= 1440 {
            ScreenSize::Medium
        } else {
            ScreenSize::Large
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_buckets() {
        let mut env = Environment::default();

        env.screen_width = 1920;
        env.screen_height = 1080;
        assert_eq!(env.screen_size(), ScreenSize::Medium);

        env.screen_width = 1366;
        env.screen_height = 768;
        assert_eq!(env.screen_size(), ScreenSize::Small);

        env.screen_width = 1900;
        env.screen_height = 1200;
        assert_eq!(env.screen_size(), ScreenSize::Small);

        env.screen_width = 3440;
        env.screen_height = 1440;
        assert_eq!(env.screen_size(), ScreenSize::Medium);

        env.screen_width = 3840;
        env.screen_height = 2160;
        assert_eq!(env.screen_size(), ScreenSize::Large);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let toml = r#"
os = "windows10"
os_version = "10.0.19043"
device_vendor = "0x8086"
device_id = "0x2772"
driver_version = "8.15.10.2202"
screen_width = 1920
screen_height = 1080
"#;
        let env: Environment = toml::from_str(toml).unwrap();
        assert_eq!(env.os, OperatingSystem::Windows10);
        assert_eq!(env.device_id, "0x2772");
        assert!(!env.battery_present); // default
        assert!(!env.secondary_gpu); // default
        assert_eq!(env.refresh_rate_status, RefreshRateStatus::Any);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut env = Environment::default();
        env.os = OperatingSystem::Linux;
        env.window_protocol = "wayland".to_string();
        env.driver_vendor = "mesa/i965".to_string();
        let text = toml::to_string(&env).unwrap();
        let back: Environment = toml::from_str(&text).unwrap();
        assert_eq!(back.os, OperatingSystem::Linux);
        assert_eq!(back.window_protocol, "wayland");
        assert_eq!(back.driver_vendor, "mesa/i965");
    }
}
