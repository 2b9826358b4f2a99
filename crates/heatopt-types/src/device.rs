// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

use serde::{Deserialize, Serialize};

const INDOOR_MIN: f64 = -30.0;
const INDOOR_MAX: f64 = 50.0;
const OUTDOOR_MIN: f64 = -60.0;
const OUTDOOR_MAX: f64 = 50.0;
const TANK_MIN: f64 = 0.0;
const TANK_MAX: f64 = 90.0;

fn in_range(v: f64, lo: f64, hi: f64) -> bool {
    v.is_finite() && v >= lo && v <= hi
}

/// Raw telemetry read from the device adapter for one cycle, before any
/// validity filtering. `sanitized()` produces the reading actually handed
/// to the decision engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub indoor_z1: f64,
    pub indoor_z2: Option<f64>,
    pub outdoor: f64,
    pub tank_temp: Option<f64>,
    pub setpoint_z1: f64,
    pub setpoint_z2: Option<f64>,
    pub setpoint_tank: Option<f64>,
    pub idle_z1: bool,
    pub daily_heat_produced_kwh: f64,
    pub daily_heat_consumed_kwh: f64,
    pub daily_dhw_produced_kwh: f64,
    pub daily_dhw_consumed_kwh: f64,
}

impl DeviceSnapshot {
    /// Drops any field outside its valid physical range, per §3 of the
    /// spec. Zone 2 is disabled for the cycle if its indoor reading alone
    /// is invalid — other fields are dropped independently.
    pub fn sanitized(&self) -> SanitizedSnapshot {
        SanitizedSnapshot {
            indoor_z1: in_range(self.indoor_z1, INDOOR_MIN, INDOOR_MAX).then_some(self.indoor_z1),
            indoor_z2: self
                .indoor_z2
                .filter(|&v| in_range(v, INDOOR_MIN, INDOOR_MAX)),
            outdoor: in_range(self.outdoor, OUTDOOR_MIN, OUTDOOR_MAX).then_some(self.outdoor),
            tank_temp: self.tank_temp.filter(|&v| in_range(v, TANK_MIN, TANK_MAX)),
            setpoint_z1: self.setpoint_z1,
            setpoint_z2: self.setpoint_z2,
            setpoint_tank: self.setpoint_tank,
            idle_z1: self.idle_z1,
            daily_heat_produced_kwh: self.daily_heat_produced_kwh,
            daily_heat_consumed_kwh: self.daily_heat_consumed_kwh,
            daily_dhw_produced_kwh: self.daily_dhw_produced_kwh,
            daily_dhw_consumed_kwh: self.daily_dhw_consumed_kwh,
        }
    }
}

/// A [`DeviceSnapshot`] after out-of-range fields have been dropped. The
/// decision engine only ever sees this shape.
#[derive(Debug, Clone, Copy)]
pub struct SanitizedSnapshot {
    pub indoor_z1: Option<f64>,
    pub indoor_z2: Option<f64>,
    pub outdoor: Option<f64>,
    pub tank_temp: Option<f64>,
    pub setpoint_z1: f64,
    pub setpoint_z2: Option<f64>,
    pub setpoint_tank: Option<f64>,
    pub idle_z1: bool,
    pub daily_heat_produced_kwh: f64,
    pub daily_heat_consumed_kwh: f64,
    pub daily_dhw_produced_kwh: f64,
    pub daily_dhw_consumed_kwh: f64,
}

impl SanitizedSnapshot {
    pub fn zone2_enabled(&self) -> bool {
        self.indoor_z2.is_some()
    }

    pub fn tank_enabled(&self) -> bool {
        self.tank_temp.is_some()
    }
}
