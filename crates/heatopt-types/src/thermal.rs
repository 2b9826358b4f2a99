// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single raw thermal reading, collected every ≤5 minutes. Samples older
/// than 30 days are condensed into [`ThermalSample`] hour-aggregates by
/// the orchestrator before being handed to weekly calibration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThermalSample {
    pub timestamp: DateTime<Utc>,
    pub indoor_c: f64,
    pub outdoor_c: f64,
    pub setpoint_c: f64,
    pub heating_active: bool,
    pub wind_mps: Option<f64>,
    pub cloud_pct: Option<f64>,
}

/// Learned thermal response of the building, re-fit weekly from
/// aggregated samples. Created empty (all coefficients zero, confidence
/// zero); a calibration without data leaves coefficients unchanged and
/// lowers confidence instead of guessing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalCharacteristics {
    pub heating_rate_per_hour: f64,
    pub cooling_rate_per_hour: f64,
    pub outdoor_impact: f64,
    pub wind_impact: f64,
    pub thermal_mass: f64,
    #[serde(default = "default_last_updated")]
    pub last_updated: DateTime<Utc>,
    pub model_confidence: f64,
}

fn default_last_updated() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

impl Default for ThermalCharacteristics {
    fn default() -> Self {
        Self {
            heating_rate_per_hour: 0.0,
            cooling_rate_per_hour: 0.0,
            outdoor_impact: 0.0,
            wind_impact: 0.0,
            thermal_mass: 0.0,
            last_updated: default_last_updated(),
            model_confidence: 0.0,
        }
    }
}

impl ThermalCharacteristics {
    /// `k_loss` in kWh/°C/h, used by savings accounting, overridden from
    /// the model once confidence clears 0.3 (spec §4.10, Open Question 2).
    pub fn space_k_loss(&self, confidence_threshold: f64) -> f64 {
        const DEFAULT_SPACE_K_LOSS: f64 = 0.4;
        if self.model_confidence >= confidence_threshold && self.thermal_mass > 0.0 {
            self.thermal_mass
        } else {
            DEFAULT_SPACE_K_LOSS
        }
    }
}
