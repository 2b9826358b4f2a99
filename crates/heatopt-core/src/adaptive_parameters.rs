// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! C6 — Adaptive Parameters.
//!
//! Incremental update of seasonal price weights, the cheap-tier
//! multiplier, and the three planning offsets after each optimization
//! outcome (spec §4.6). `overall_confidence` saturates to 1 around 60
//! learning cycles.

use heatopt_types::adaptive::AdaptiveParameters;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Summer,
    Winter,
    Transition,
}

/// What the orchestrator feeds back after one completed cycle.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeFeedback {
    pub realized_savings_minor: i64,
    pub comfort_violations: u32,
    pub realized_cop: f64,
    pub season: Season,
    pub was_very_cheap_hour: bool,
}

const MAX_OFFSET_STEP_C: f64 = 0.05;
const CYCLES_TO_SATURATE: f64 = 60.0;

fn price_weight_mut(params: &mut AdaptiveParameters, season: Season) -> &mut f64 {
    match season {
        Season::Summer => &mut params.price_weight_summer,
        Season::Winter => &mut params.price_weight_winter,
        Season::Transition => &mut params.price_weight_transition,
    }
}

/// Applies one outcome's feedback to `params` in place, per spec §4.6.
pub fn ingest(params: &mut AdaptiveParameters, feedback: OutcomeFeedback) {
    params.learning_cycles += 1;

    let favorable = feedback.realized_savings_minor > 0 && feedback.comfort_violations == 0;
    let step = 0.02;
    {
        let weight = price_weight_mut(params, feedback.season);
        if favorable {
            *weight += step;
        } else if feedback.realized_savings_minor < 0 || feedback.comfort_violations > 0 {
            *weight -= step;
        }
    }

    if feedback.was_very_cheap_hour && favorable {
        params.cheap_tier_multiplier += 0.01;
    }

    let confidence_scaled_step = MAX_OFFSET_STEP_C * params.overall_confidence.max(0.1);
    let drift = if favorable {
        confidence_scaled_step
    } else {
        -confidence_scaled_step
    };
    params.preheat_aggressiveness += drift;
    params.coasting_reduction += drift;
    params.boost_increase += drift;

    params.overall_confidence = (params.learning_cycles as f64 / CYCLES_TO_SATURATE).min(1.0);
    params.clamp();
}
