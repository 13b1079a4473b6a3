//! TOML-based configuration system.
//!
//! Loads settings from a `config.toml` file, falling back to defaults that
//! match the built-in behavior. Every struct implements `Default` so a
//! missing or partial config file behaves like no file at all.
//!
//! ## Config file search order
//!
//! 1. `GFXBLOCK_CONFIG` environment variable (explicit override)
//! 2. Next to the executable (`<exe_dir>/config.toml`)
//! 3. Platform config directory (`%APPDATA%\gfxblock\config.toml` on Windows)
//! 4. Current working directory (`./config.toml`)
//! 5. No file found → `Config::default()`
//!
//! Besides engine settings, a config file may carry extra blocklist rules
//! (`[[rules]]` entries). These are a local, static supplement to the
//! built-in table — validated through the same builder, appended after the
//! built-in rules, and dropped with a warning if invalid.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::device::DeviceSet;
use crate::rule::{
    BatteryStatus, ConstructionError, FeatureStatus, OperatingSystem, Rule, RuleFeature,
    ScreenSizeClass,
};
use crate::version::{ComparisonOp, DriverVersion, VersionPadding};

// ─────────────────────────────────────────────────────────────────────────────
// Config structs
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub rules: Vec<RuleEntry>,
}

/// Evaluation engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Force the decimal padding quirk on or off. Unset = platform default.
    pub decimal_padding: Option<bool>,
    /// Status reported when no rule matches.
    pub default_status: FeatureStatus,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decimal_padding: None,
            default_status: FeatureStatus::Ok,
        }
    }
}

impl EngineConfig {
    /// The effective version-interpretation policy.
    pub fn padding(&self) -> VersionPadding {
        match self.decimal_padding {
            Some(true) => VersionPadding::PadDecimal,
            Some(false) => VersionPadding::None,
            None => VersionPadding::platform_default(),
        }
    }
}

/// One locally supplied blocklist rule, in flat TOML-friendly form.
/// Unset fields are wildcards, mirroring the builder defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleEntry {
    /// Stable diagnostic id; required in practice, empty ids make
    /// telemetry useless but are not rejected.
    pub id: String,
    pub os: OperatingSystem,
    pub screen: ScreenSizeClass,
    pub battery: BatteryStatus,
    pub window_protocol: String,
    pub device_vendor: String,
    pub driver_vendor: String,
    /// Discrete device ids ("0x1234").
    pub devices: Vec<String>,
    /// Inclusive [begin, end] device id ranges.
    pub device_ranges: Vec<[i64; 2]>,
    /// Feature name, or "all" / "optional".
    pub feature: String,
    pub status: FeatureStatus,
    pub comparison: ComparisonOp,
    /// Lower (or sole) driver version bound.
    pub version: Option<String>,
    /// Upper bound, for the between operators.
    pub version_max: Option<String>,
    pub suggested_version: Option<String>,
    pub gpu2: bool,
}

impl Default for RuleEntry {
    fn default() -> Self {
        Self {
            id: String::new(),
            os: OperatingSystem::Unknown,
            screen: ScreenSizeClass::All,
            battery: BatteryStatus::All,
            window_protocol: String::new(),
            device_vendor: String::new(),
            driver_vendor: String::new(),
            devices: Vec::new(),
            device_ranges: Vec::new(),
            feature: "optional".to_string(),
            status: FeatureStatus::Ok,
            comparison: ComparisonOp::Ignored,
            version: None,
            version_max: None,
            suggested_version: None,
            gpu2: false,
        }
    }
}

impl RuleEntry {
    /// Validates the entry into a [`Rule`], interpreting version bounds
    /// under the same padding policy as the table it will join.
    pub fn to_rule(&self, padding: VersionPadding) -> Result<Rule, ConstructionError> {
        let feature = RuleFeature::from_name(&self.feature).ok_or_else(|| {
            ConstructionError::UnknownFeature {
                rule_id: self.id.clone(),
                name: self.feature.clone(),
            }
        })?;

        let parse = |text: &str| {
            DriverVersion::parse(text, padding).map_err(|source| {
                ConstructionError::InvalidVersion {
                    rule_id: self.id.clone(),
                    source,
                }
            })
        };

        let mut devices = DeviceSet::new();
        for id in &self.devices {
            devices.add(id);
        }
        for [begin, end] in &self.device_ranges {
            devices.add_range(*begin, *end);
        }

        let mut builder = Rule::builder(self.id.clone())
            .os(self.os)
            .screen(self.screen)
            .battery(self.battery)
            .window_protocol_str(self.window_protocol.clone())
            .device_vendor_str(self.device_vendor.clone())
            .driver_vendor_str(self.driver_vendor.clone())
            .device_set(Arc::new(devices))
            .features(feature)
            .status(self.status);

        if self.comparison != ComparisonOp::Ignored {
            let min = parse(self.version.as_deref().unwrap_or(""))?;
            builder = match &self.version_max {
                Some(max) => builder.driver_version_between(self.comparison, min, parse(max)?),
                None => builder.driver_version(self.comparison, min),
            };
        }

        if let Some(suggested) = &self.suggested_version {
            builder = builder.suggested_version(suggested.clone());
        }
        if self.gpu2 {
            builder = builder.gpu2();
        }

        builder.build()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Loads configuration from the standard locations. Never panics —
    /// returns defaults if no file is found or if parsing fails.
    pub fn load() -> Self {
        match find_config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                info!("No config file found, using defaults");
                Config::default()
            }
        }
    }

    /// Loads configuration from an explicit path, with the same
    /// defaults-on-error behavior.
    pub fn load_from(path: &std::path::Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => {
                    info!(path = %path.display(), rules = config.rules.len(), "Configuration loaded");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                    Config::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read config, using defaults");
                Config::default()
            }
        }
    }
}

/// Searches for a config file in the standard locations.
fn find_config_path() -> Option<PathBuf> {
    // 1. Explicit env var override
    if let Ok(path) = std::env::var("GFXBLOCK_CONFIG") {
        let p = PathBuf::from(path);
        if p.is_file() {
            return Some(p);
        }
    }

    // 2. Next to the executable
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let p = dir.join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    // 3. Platform config directory
    if let Some(dir) = platform_config_dir() {
        let p = dir.join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    // 4. Current working directory
    let p = PathBuf::from("config.toml");
    if p.is_file() {
        return Some(p);
    }

    None
}

/// Returns the platform config directory without adding a dependency.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join("gfxblock"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .or_else(|| std::env::var("HOME").ok().map(|h| format!("{h}/.config")))
            .map(|dir| PathBuf::from(dir).join("gfxblock"))
    }
}
