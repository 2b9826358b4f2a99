// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Settings surface (spec §6) and the immutable per-cycle [`RunConfig`]
//! built from it. Settings are read once per hour into `RunConfig`;
//! nothing downstream holds a mutable reference to global settings (spec
//! §9, "no `global.homeySettings`").

use heatopt_types::comfort::ComfortBand;
use heatopt_types::constraints::ZoneConstraints;
use serde::{Deserialize, Serialize};

fn default_temp_step() -> f64 {
    0.5
}
fn default_deadband() -> f64 {
    0.3
}
fn default_min_change_minutes() -> i64 {
    30
}
fn default_preheat_cheap_percentile() -> f64 {
    0.25
}
fn default_cop_weight() -> f64 {
    0.3
}
fn default_true() -> bool {
    true
}
fn default_currency_code() -> String {
    "EUR".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Retail,
    Wholesale,
}

/// Top-level settings, deserialized from TOML. Every optional field has
/// a default and, where the source renamed a field, an `alias` so old
/// settings files keep loading (spec §6's `time_zone_offset`/`use_dst`
/// deprecation is the canonical example).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub device_credentials: String,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub building_id: Option<String>,

    #[serde(default = "default_price_source")]
    pub price_source: PriceSource,
    #[serde(default)]
    pub retail_token: Option<String>,
    #[serde(default)]
    pub wholesale_area: Option<String>,
    #[serde(default)]
    pub wholesale_token: Option<String>,
    #[serde(default = "default_currency_code")]
    pub currency_code: String,
    #[serde(default)]
    pub enable_consumer_markup: bool,

    #[serde(default = "default_comfort_lower_occupied")]
    pub comfort_lower_occupied: f64,
    #[serde(default = "default_comfort_upper_occupied")]
    pub comfort_upper_occupied: f64,
    #[serde(default = "default_comfort_lower_away")]
    pub comfort_lower_away: f64,
    #[serde(default = "default_comfort_upper_away")]
    pub comfort_upper_away: f64,
    #[serde(default = "default_temp_step")]
    pub temp_step: f64,
    #[serde(default = "default_deadband")]
    pub deadband_c: f64,
    #[serde(default = "default_min_change_minutes")]
    pub min_change_minutes: i64,

    #[serde(default)]
    pub enable_zone2: bool,
    #[serde(default)]
    pub zone2_lower_occupied: Option<f64>,
    #[serde(default)]
    pub zone2_upper_occupied: Option<f64>,
    #[serde(default)]
    pub zone2_step: Option<f64>,

    #[serde(default)]
    pub enable_tank_control: bool,
    #[serde(default)]
    pub tank_lower_c: Option<f64>,
    #[serde(default)]
    pub tank_upper_c: Option<f64>,
    #[serde(default)]
    pub tank_step: Option<f64>,

    #[serde(default = "default_preheat_cheap_percentile")]
    pub preheat_cheap_percentile: f64,
    #[serde(default = "default_cop_weight")]
    pub cop_weight: f64,
    #[serde(default = "default_true")]
    pub auto_seasonal_mode: bool,
    #[serde(default)]
    pub summer_mode: bool,

    #[serde(alias = "time_zone_offset", alias = "use_dst")]
    pub time_zone_name: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_to_timeline: bool,
}

fn default_price_source() -> PriceSource {
    PriceSource::Retail
}
fn default_comfort_lower_occupied() -> f64 {
    20.0
}
fn default_comfort_upper_occupied() -> f64 {
    22.0
}
fn default_comfort_lower_away() -> f64 {
    17.0
}
fn default_comfort_upper_away() -> f64 {
    19.0
}

impl Settings {
    pub fn comfort_band_occupied(&self) -> ComfortBand {
        ComfortBand::new(self.comfort_lower_occupied, self.comfort_upper_occupied)
    }

    pub fn comfort_band_away(&self) -> ComfortBand {
        ComfortBand::new(self.comfort_lower_away, self.comfort_upper_away)
    }

    pub fn zone1_constraints(&self, comfort: ComfortBand) -> ZoneConstraints {
        ZoneConstraints {
            min_c: comfort.lower_c,
            max_c: comfort.upper_c,
            step_c: self.temp_step,
            deadband_c: self.deadband_c,
            min_change_minutes: self.min_change_minutes,
        }
    }
}

/// Immutable snapshot assembled once per cycle from [`Settings`] plus
/// device limits. The orchestrator passes this by value/reference; it is
/// never mutated mid-cycle (spec §9).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub settings: Settings,
    pub comfort_band: ComfortBand,
    pub zone1_constraints: ZoneConstraints,
    pub zone2_constraints: Option<ZoneConstraints>,
    pub tank_constraints: Option<ZoneConstraints>,
}
