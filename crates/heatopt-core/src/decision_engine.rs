// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! C9 — Decision Engine.
//!
//! Pure function combining C3-C8 snapshots into per-zone setpoint
//! proposals (spec §4.9). Takes immutable inputs, returns a plain value;
//! it never mutates a learner and never performs I/O.

use heatopt_types::adaptive::AdaptiveParameters;
use heatopt_types::comfort::ComfortBand;
use heatopt_types::outcome::PlannedAction;
use heatopt_types::price::{PriceAnalysis, PriceTier};

use crate::weather_bias::WeatherBiasResult;

/// Next few hours of price tiers the thermal-planning step consults.
#[derive(Debug, Clone, Copy)]
pub struct NearTermTiers {
    pub cheap_hours_in_next_6: u32,
    pub current_hour_is_cheap: bool,
    pub expensive_hours_in_next_3: u32,
}

#[derive(Debug, Clone)]
pub struct ZoneInputs {
    pub current_setpoint_c: f64,
    pub indoor_c: Option<f64>,
    pub comfort_band: ComfortBand,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct TankInputs {
    pub current_setpoint_c: f64,
    pub min_c: f64,
    pub max_c: f64,
    pub step_c: f64,
    pub enabled: bool,
    pub demand_next_4h: f64,
}

#[derive(Debug, Clone)]
pub struct DecisionInputs {
    pub price: PriceAnalysis,
    pub near_term: NearTermTiers,
    pub seasonal_cop: Option<f64>,
    pub adaptive: AdaptiveParameters,
    pub thermal_confidence: f64,
    pub weather: WeatherBiasResult,
    pub zone1: ZoneInputs,
    pub zone2: Option<ZoneInputs>,
    pub tank: Option<TankInputs>,
    pub cop_weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneProposal {
    pub target_c: f64,
}

#[derive(Debug, Clone)]
pub struct TankProposal {
    pub target_c: f64,
}

#[derive(Debug, Clone)]
pub struct DecisionOutput {
    pub zone1_target: ZoneProposal,
    pub zone2_target: Option<ZoneProposal>,
    pub tank_target: Option<TankProposal>,
    pub reason_tokens: Vec<String>,
    pub planned_action: PlannedAction,
}

/// COP bias tiers are mutually exclusive (spec §4.9 step 3 read as
/// non-overlapping thresholds: excellent > good > poor).
fn cop_bias(seasonal_cop: Option<f64>, adaptive: &AdaptiveParameters, base_offset: f64, cop_weight: f64) -> f64 {
    let Some(cop) = seasonal_cop else {
        return 0.0;
    };
    let thresholds = adaptive.cop_thresholds;
    if cop >= thresholds.excellent {
        0.2
    } else if cop >= thresholds.good {
        -0.3 * base_offset.abs()
    } else if cop >= thresholds.poor {
        -0.8 * cop_weight
    } else {
        -1.2 * cop_weight
    }
}

/// Graduated thermal-planning bias: the "learned" preheat/coast decision
/// scaled continuously by model confidence, never gated by a binary
/// cutoff (spec §4.9 step 4).
fn thermal_bias(
    near_term: &NearTermTiers,
    indoor_c: Option<f64>,
    mid_c: f64,
    adaptive: &AdaptiveParameters,
    confidence: f64,
) -> f64 {
    let mut learned = 0.0_f64;
    if near_term.cheap_hours_in_next_6 >= 2 && !near_term.current_hour_is_cheap {
        learned += adaptive.preheat_aggressiveness;
    }
    if near_term.expensive_hours_in_next_3 >= 1 && indoor_c.is_some_and(|i| i >= mid_c) {
        learned -= adaptive.coasting_reduction;
    }
    learned * confidence.clamp(0.0, 1.0)
}

fn zone1_target_c(inputs: &DecisionInputs, reason_tokens: &mut Vec<String>) -> f64 {
    let band = inputs.zone1.comfort_band;
    let mid_c = band.mid_c();
    let range_c = band.range_c();

    let base_offset = (0.5 - inputs.price.percentile_rank) * range_c;
    let mut offset = base_offset;

    offset += cop_bias(
        inputs.seasonal_cop,
        &inputs.adaptive,
        base_offset,
        inputs.cop_weight,
    );

    offset += thermal_bias(
        &inputs.near_term,
        inputs.zone1.indoor_c,
        mid_c,
        &inputs.adaptive,
        inputs.thermal_confidence,
    );

    offset += inputs.weather.bias_c;
    if let Some(token) = inputs.weather.reason_token {
        reason_tokens.push(token.to_string());
    }

    (mid_c + offset).clamp(band.lower_c, band.upper_c)
}

fn zone2_target_c(inputs: &DecisionInputs, zone2: &ZoneInputs, reason_tokens: &mut Vec<String>) -> f64 {
    // Identical formula to zone 1 with zone 2's own comfort band.
    let band = zone2.comfort_band;
    let mid_c = band.mid_c();
    let range_c = band.range_c();

    let base_offset = (0.5 - inputs.price.percentile_rank) * range_c;
    let mut offset = base_offset;
    offset += cop_bias(
        inputs.seasonal_cop,
        &inputs.adaptive,
        base_offset,
        inputs.cop_weight,
    );
    offset += thermal_bias(
        &inputs.near_term,
        zone2.indoor_c,
        mid_c,
        &inputs.adaptive,
        inputs.thermal_confidence,
    );
    offset += inputs.weather.bias_c;
    let _ = reason_tokens;

    (mid_c + offset).clamp(band.lower_c, band.upper_c)
}

fn tank_proposal(price_tier: PriceTier, tank: &TankInputs) -> Option<TankProposal> {
    if price_tier.is_cheap_or_better() && tank.demand_next_4h >= 0.3 {
        return Some(TankProposal {
            target_c: (tank.current_setpoint_c + tank.step_c).min(tank.max_c),
        });
    }
    if price_tier == PriceTier::VeryExpensive && tank.demand_next_4h <= 0.3 {
        return Some(TankProposal {
            target_c: (tank.current_setpoint_c - tank.step_c).max(tank.min_c),
        });
    }
    None
}

fn planned_action_for(
    price_tier: PriceTier,
    zone1_target: f64,
    zone1_current: f64,
    tank_proposal: &Option<TankProposal>,
) -> PlannedAction {
    if let Some(tank) = tank_proposal {
        if tank.target_c > 0.0 && price_tier.is_cheap_or_better() {
            return PlannedAction::DhwNow;
        }
        return PlannedAction::DhwDelay;
    }
    if zone1_target > zone1_current {
        PlannedAction::Preheat
    } else if zone1_target < zone1_current {
        PlannedAction::Coast
    } else {
        PlannedAction::Maintain
    }
}

/// Entry point: combines all learner snapshots into one cycle's
/// proposal. Invalid-reading policy (zone 2 / tank sensor disabled) is
/// expected to already be reflected in `inputs.zone2`/`inputs.tank` being
/// `None`, and the corresponding reason token is pushed here so callers
/// don't have to remember to do it.
pub fn decide(inputs: &DecisionInputs) -> DecisionOutput {
    let mut reason_tokens = Vec::new();

    let zone1_target = zone1_target_c(inputs, &mut reason_tokens);

    let zone2_target = match &inputs.zone2 {
        Some(zone2) if zone2.enabled => Some(ZoneProposal {
            target_c: zone2_target_c(inputs, zone2, &mut reason_tokens),
        }),
        Some(_) => {
            reason_tokens.push("zone2_sensor_invalid".to_string());
            None
        }
        None => None,
    };

    let tank_target = match &inputs.tank {
        Some(tank) if tank.enabled => tank_proposal(inputs.price.tier, tank),
        Some(_) => {
            reason_tokens.push("tank_sensor_invalid".to_string());
            None
        }
        None => None,
    };

    let planned_action = planned_action_for(
        inputs.price.tier,
        zone1_target,
        inputs.zone1.current_setpoint_c,
        &tank_target,
    );

    DecisionOutput {
        zone1_target: ZoneProposal { target_c: zone1_target },
        zone2_target,
        tank_target,
        reason_tokens,
        planned_action,
    }
}

/// Per-zone state machine (spec §4.9). Transitions are driven by the
/// decision engine's output plus the constraint kernel's lockout result;
/// the orchestrator owns the current state and calls [`transition`] once
/// per zone per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneState {
    Idle,
    Preheating,
    Coasting,
    Boosting,
    DhwHeating,
    Locked,
}

pub struct TransitionInputs {
    pub action: PlannedAction,
    pub lockout_active: bool,
    pub lockout_elapsed: bool,
    pub indoor_reached_upper: bool,
    pub price_left_cheap: bool,
}

pub fn transition(state: ZoneState, inputs: &TransitionInputs) -> ZoneState {
    if inputs.lockout_active {
        return ZoneState::Locked;
    }
    match state {
        ZoneState::Locked => {
            if inputs.lockout_elapsed {
                ZoneState::Idle
            } else {
                ZoneState::Locked
            }
        }
        ZoneState::Idle => match inputs.action {
            PlannedAction::Preheat => ZoneState::Preheating,
            PlannedAction::Coast => ZoneState::Coasting,
            PlannedAction::Boost => ZoneState::Boosting,
            PlannedAction::DhwNow => ZoneState::DhwHeating,
            PlannedAction::Maintain | PlannedAction::DhwDelay => ZoneState::Idle,
        },
        ZoneState::Preheating => {
            if inputs.indoor_reached_upper || inputs.price_left_cheap {
                ZoneState::Idle
            } else {
                ZoneState::Preheating
            }
        }
        ZoneState::Coasting | ZoneState::Boosting | ZoneState::DhwHeating => {
            match inputs.action {
                PlannedAction::Maintain => ZoneState::Idle,
                _ => state,
            }
        }
    }
}
