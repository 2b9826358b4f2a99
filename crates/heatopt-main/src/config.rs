// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Application-level configuration: the optimizer [`Settings`] plus the
//! connection details the binary needs to wire up its adapters. Loaded
//! once at startup from whichever source is available, falling back to
//! environment-variable overrides in development.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use heatopt_core::config::Settings;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

fn default_poll_interval_secs() -> u64 {
    60
}
fn default_device_base_url() -> String {
    "http://localhost:8090".to_string()
}
fn default_price_base_url() -> String {
    "http://localhost:8091".to_string()
}
fn default_weather_base_url() -> String {
    "https://api.open-meteo.com".to_string()
}
fn default_latitude() -> f64 {
    50.0755
}
fn default_longitude() -> f64 {
    14.4378
}
fn default_storage_dir() -> PathBuf {
    PathBuf::from("./data")
}

/// Everything the binary needs to run the hourly cycle loop: the
/// optimizer settings plus where to reach the device, price and weather
/// adapters, and where to persist state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub settings: Settings,

    #[serde(default = "default_device_base_url")]
    pub device_base_url: String,
    #[serde(default)]
    pub device_api_key: String,

    #[serde(default = "default_price_base_url")]
    pub price_base_url: String,

    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,

    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    #[serde(default)]
    pub timeline_webhook_url: Option<String>,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

/// Environment variable naming the config file to load, checked before
/// the default search path.
const CONFIG_PATH_ENV: &str = "HEATOPT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./config.toml";

impl AppConfig {
    /// Load configuration, trying (in order) the path named by
    /// `HEATOPT_CONFIG`, `./config.toml`, `./config.json`, then defaults
    /// overridden by environment variables.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let config = Self::load_from_path(Path::new(&path))
                .with_context(|| format!("failed to load config from {CONFIG_PATH_ENV}={path}"))?;
            info!(path, "loaded configuration");
            config.validate()?;
            return Ok(config);
        }

        if let Ok(config) = Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH)) {
            info!(path = DEFAULT_CONFIG_PATH, "loaded configuration");
            config.validate()?;
            return Ok(config);
        }

        if let Ok(config) = Self::load_from_path(Path::new("./config.json")) {
            info!(path = "./config.json", "loaded configuration");
            config.validate()?;
            return Ok(config);
        }

        warn!("no configuration file found, using defaults with environment overrides");
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&raw).context("failed to parse config as JSON"),
            _ => toml::from_str(&raw).context("failed to parse config as TOML"),
        }
    }

    fn from_env() -> Result<Self> {
        let time_zone_name = std::env::var("HEATOPT_TIME_ZONE").unwrap_or_else(|_| "UTC".to_string());
        let device_credentials = std::env::var("HEATOPT_DEVICE_CREDENTIALS").unwrap_or_default();

        let settings_toml = format!(
            "device_credentials = \"{device_credentials}\"\ntime_zone_name = \"{time_zone_name}\"\n"
        );
        let mut settings: Settings = toml::from_str(&settings_toml)?;

        if let Ok(device_id) = std::env::var("HEATOPT_DEVICE_ID") {
            settings.device_id = Some(device_id);
        }
        if let Ok(building_id) = std::env::var("HEATOPT_BUILDING_ID") {
            settings.building_id = Some(building_id);
        }

        let mut config = AppConfig {
            settings,
            device_base_url: default_device_base_url(),
            device_api_key: String::new(),
            price_base_url: default_price_base_url(),
            weather_base_url: default_weather_base_url(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            storage_dir: default_storage_dir(),
            timeline_webhook_url: None,
            poll_interval_secs: default_poll_interval_secs(),
        };

        if let Ok(url) = std::env::var("HEATOPT_DEVICE_BASE_URL") {
            config.device_base_url = url;
        }
        if let Ok(key) = std::env::var("HEATOPT_DEVICE_API_KEY") {
            config.device_api_key = key;
        }
        if let Ok(url) = std::env::var("HEATOPT_PRICE_BASE_URL") {
            config.price_base_url = url;
        }
        if let Ok(url) = std::env::var("HEATOPT_TIMELINE_WEBHOOK") {
            config.timeline_webhook_url = Some(url);
        }

        Ok(config)
    }

    /// Validate settings that would otherwise surface as a confusing
    /// runtime error hours into the first cycle.
    pub fn validate(&self) -> Result<()> {
        if self.settings.device_credentials.is_empty() {
            anyhow::bail!("device_credentials must not be empty");
        }
        if self.settings.comfort_lower_occupied >= self.settings.comfort_upper_occupied {
            anyhow::bail!("comfort_lower_occupied must be less than comfort_upper_occupied");
        }
        if self.settings.comfort_lower_away >= self.settings.comfort_upper_away {
            anyhow::bail!("comfort_lower_away must be less than comfort_upper_away");
        }
        if self.settings.preheat_cheap_percentile <= 0.0 || self.settings.preheat_cheap_percentile >= 1.0 {
            anyhow::bail!("preheat_cheap_percentile must be between 0 and 1");
        }
        if self.settings.cop_weight < 0.0 || self.settings.cop_weight > 1.0 {
            anyhow::bail!("cop_weight must be between 0.0 and 1.0");
        }
        if self.settings.enable_zone2
            && (self.settings.zone2_lower_occupied.is_none() || self.settings.zone2_upper_occupied.is_none())
        {
            anyhow::bail!("enable_zone2 is set but zone2 comfort bounds are missing");
        }
        if self.settings.enable_tank_control
            && (self.settings.tank_lower_c.is_none() || self.settings.tank_upper_c.is_none())
        {
            anyhow::bail!("enable_tank_control is set but tank bounds are missing");
        }
        if self.poll_interval_secs < 10 {
            anyhow::bail!("poll_interval_secs must be at least 10 seconds");
        }
        if self.poll_interval_secs > 3600 {
            warn!(secs = self.poll_interval_secs, "poll_interval_secs is very high, consider reducing");
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        info!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
