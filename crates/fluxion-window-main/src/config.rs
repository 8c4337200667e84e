// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz


use anyhow::{Context, Result};
use fluxion_window_core::{ExpressionValue, WindowConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const ADDON_OPTIONS_PATH: &str = "/data/options.json";
const DEFAULT_SOURCE_ENTITY: &str = "sensor.current_spot_electricity_price_15min";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configured price windows (one or more)
    pub windows: Vec<WindowConfig>,

    /// System configuration
    #[serde(default)]
    pub system: SystemConfig,
}

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Periodic recalculation interval (seconds)
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,

    /// How often source entities are polled for changes (seconds)
    #[serde(default = "default_watch_interval")]
    pub watch_interval_secs: u64,

    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// HA base URL (optional, falls back to HA_BASE_URL)
    #[serde(default)]
    pub ha_base_url: Option<String>,

    /// HA long-lived access token (optional, falls back to HA_TOKEN)
    #[serde(default)]
    pub ha_token: Option<String>,

    /// Fallback timezone when HA does not report one (e.g. "Europe/Prague")
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: default_update_interval(),
            watch_interval_secs: default_watch_interval(),
            log_level: default_log_level(),
            ha_base_url: None,
            ha_token: None,
            timezone: None,
        }
    }
}

impl SystemConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch_interval_secs)
    }
}

fn default_update_interval() -> u64 {
    60
}

fn default_watch_interval() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    AddonOptions,
    File(PathBuf),
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddonOptions => write!(f, "HA addon options"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Environment => write!(f, "defaults with environment overrides"),
        }
    }
}

impl Default for AppConfig {
    /// Single window on the default spot price sensor
    fn default() -> Self {
        Self {
            windows: vec![WindowConfig::new(DEFAULT_SOURCE_ENTITY)],
            system: SystemConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from HA addon options or config file
    pub fn load() -> Result<(Self, ConfigSource)> {
        // Try HA addon options first (/data/options.json)
        if Path::new(ADDON_OPTIONS_PATH).exists() {
            let config = Self::load_from_path(ADDON_OPTIONS_PATH)
                .context("Failed to load HA addon options")?;
            return Ok((config, ConfigSource::AddonOptions));
        }

        // Try config.toml / config.json for development
        for candidate in ["config.toml", "config.json"] {
            if Path::new(candidate).exists() {
                let config = Self::load_from_path(candidate)?;
                return Ok((config, ConfigSource::File(PathBuf::from(candidate))));
            }
        }

        // Fall back to defaults with environment variable overrides
        let config = Self::from_env();
        config.validate()?;
        Ok((config, ConfigSource::Environment))
    }

    /// Load and validate a TOML or JSON file, chosen by extension
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables (development/testing)
    fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(entity) = var("WINDOW_SOURCE_ENTITY") {
            config.windows[0].source_entity = entity;
        }
        if let Some(duration) = var("WINDOW_DURATION") {
            config.windows[0].duration = ExpressionValue::Text(duration);
        }

        // Override update interval
        if let Some(interval) = var("UPDATE_INTERVAL_SECS")
            && let Ok(secs) = interval.parse::<u64>()
        {
            config.system.update_interval_secs = secs;
        }

        // Override HA connection
        if let Some(url) = var("HA_BASE_URL") {
            config.system.ha_base_url = Some(url);
        }
        if let Some(token) = var("HA_TOKEN") {
            config.system.ha_token = Some(token);
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.windows.is_empty() {
            anyhow::bail!("Configuration must include at least one window");
        }

        let mut names = HashSet::new();
        let mut entity_ids = HashSet::new();
        for (idx, window) in self.windows.iter().enumerate() {
            if window.name.trim().is_empty() {
                anyhow::bail!("Window {} has empty name", idx);
            }
            if !names.insert(window.name.as_str()) {
                anyhow::bail!("Duplicate window name: '{}'", window.name);
            }
            if window.source_entity.trim().is_empty() {
                anyhow::bail!("Window '{}' has empty source_entity", window.name);
            }
            let entity_id = window.entity_id();
            if !entity_ids.insert(entity_id.clone()) {
                anyhow::bail!(
                    "Window '{}' publishes to {} which is already used",
                    window.name,
                    entity_id
                );
            }
        }

        if self.system.update_interval_secs < 10 {
            anyhow::bail!("update_interval_secs must be at least 10 seconds");
        }
        if self.system.watch_interval_secs < 1 {
            anyhow::bail!("watch_interval_secs must be at least 1 second");
        }
        if self.system.update_interval_secs > 3600 {
            warn!(
                "update_interval_secs is very high ({}s), the active flag will lag",
                self.system.update_interval_secs
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.windows.len(), 1);
        assert_eq!(config.windows[0].source_entity, DEFAULT_SOURCE_ENTITY);
        assert_eq!(config.system.update_interval_secs, 60);
        assert_eq!(config.system.watch_interval_secs, 10);

        // Validation should pass on default
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_windows() {
        let mut config = AppConfig::default();
        config.windows.clear();

        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("at least one window")
        );
    }

    #[test]
    fn test_validate_duplicate_names() {
        let mut config = AppConfig::default();
        config.windows.push(config.windows[0].clone());

        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("Duplicate window name")
        );
    }

    #[test]
    fn test_validate_duplicate_entity_ids() {
        let mut config = AppConfig::default();
        let mut second = config.windows[0].clone();
        second.name = "price window".to_owned();
        config.windows.push(second);

        assert!(config.validate().unwrap_err().to_string().contains("already used"));
    }

    #[test]
    fn test_validate_empty_source() {
        let mut config = AppConfig::default();
        config.windows[0].source_entity = " ".to_owned();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_intervals() {
        let mut config = AppConfig::default();
        config.system.update_interval_secs = 5;
        assert!(config.validate().is_err());

        config.system.update_interval_secs = 60;
        config.system.watch_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("WINDOW_SOURCE_ENTITY", "sensor.nordpool"),
            ("WINDOW_DURATION", "1:30"),
            ("UPDATE_INTERVAL_SECS", "120"),
            ("HA_BASE_URL", "http://ha.local:8123"),
            ("HA_TOKEN", "secret"),
        ]);

        let config = AppConfig::from_vars(|key| vars.get(key).map(|v| (*v).to_owned()));

        assert_eq!(config.windows[0].source_entity, "sensor.nordpool");
        assert_eq!(config.windows[0].duration, ExpressionValue::from("1:30"));
        assert_eq!(config.system.update_interval_secs, 120);
        assert_eq!(config.system.ha_base_url.as_deref(), Some("http://ha.local:8123"));
        assert_eq!(config.system.ha_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[system]
update_interval_secs = 30
timezone = "Europe/Prague"

[[windows]]
name = "Dishwasher"
source_entity = "sensor.spot_price"
forecast_entity = "sensor.spot_forecast"
end_time = "22:00"
duration = 2
continuous = true

[[windows]]
name = "Heat Pump"
source_entity = "sensor.spot_price"
duration = "{{{{ states('input_number.heat_pump_hours') }}}}"
continuous = false
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();

        assert_eq!(config.system.update_interval_secs, 30);
        assert_eq!(config.system.watch_interval_secs, 10);
        assert_eq!(config.windows.len(), 2);
        assert_eq!(config.windows[0].duration, ExpressionValue::Number(2.0));
        assert_eq!(config.windows[0].entity_id(), "binary_sensor.dishwasher");
        assert!(config.windows[1].duration.is_template());
        assert_eq!(config.windows[1].continuous, ExpressionValue::Bool(false));
    }

    #[test]
    fn test_load_addon_options_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "windows": [{{
                    "sensor_name": "sensor.spot_price",
                    "forecast_source_entity": "",
                    "start_time": "",
                    "duration": "3:00"
                }}]
            }}"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();

        assert_eq!(config.windows[0].source_entity, "sensor.spot_price");
        assert!(config.windows[0].forecast_entity.is_none());
        assert!(config.windows[0].start_time.is_none());
        assert_eq!(config.system.update_interval_secs, 60);
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"windows": []}}"#).unwrap();

        assert!(AppConfig::load_from_path(file.path()).is_err());
    }
}
