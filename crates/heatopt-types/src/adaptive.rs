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

fn default_price_weight() -> f64 {
    0.5
}
fn default_cheap_tier_multiplier() -> f64 {
    1.0
}
fn default_cop_thresholds() -> CopThresholds {
    CopThresholds::default()
}

/// Seasonal COP cutoffs used by the decision engine's COP bias step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CopThresholds {
    pub excellent: f64,
    pub good: f64,
    pub poor: f64,
}

impl Default for CopThresholds {
    fn default() -> Self {
        Self {
            excellent: 4.0,
            good: 3.0,
            poor: 2.0,
        }
    }
}

/// Learned weights that bias the decision engine, updated incrementally
/// after each optimization outcome (spec §4.6). Until
/// `overall_confidence >= 0.3`, callers MUST blend outputs 50/50 with
/// [`AdaptiveParameters::default`] rather than use them outright.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveParameters {
    #[serde(default = "default_price_weight")]
    pub price_weight_summer: f64,
    #[serde(default = "default_price_weight")]
    pub price_weight_winter: f64,
    #[serde(default = "default_price_weight")]
    pub price_weight_transition: f64,
    #[serde(default = "default_cheap_tier_multiplier")]
    pub cheap_tier_multiplier: f64,
    #[serde(default)]
    pub preheat_aggressiveness: f64,
    #[serde(default)]
    pub coasting_reduction: f64,
    #[serde(default)]
    pub boost_increase: f64,
    #[serde(default = "default_cop_thresholds")]
    pub cop_thresholds: CopThresholds,
    #[serde(default)]
    pub learning_cycles: u32,
    #[serde(default)]
    pub overall_confidence: f64,
}

impl Default for AdaptiveParameters {
    fn default() -> Self {
        Self {
            price_weight_summer: default_price_weight(),
            price_weight_winter: default_price_weight(),
            price_weight_transition: default_price_weight(),
            cheap_tier_multiplier: default_cheap_tier_multiplier(),
            preheat_aggressiveness: 0.0,
            coasting_reduction: 0.0,
            boost_increase: 0.0,
            cop_thresholds: CopThresholds::default(),
            learning_cycles: 0,
            overall_confidence: 0.0,
        }
    }
}

impl AdaptiveParameters {
    pub fn clamp(&mut self) {
        self.price_weight_summer = self.price_weight_summer.clamp(0.2, 0.9);
        self.price_weight_winter = self.price_weight_winter.clamp(0.2, 0.9);
        self.price_weight_transition = self.price_weight_transition.clamp(0.2, 0.9);
        self.cheap_tier_multiplier = self.cheap_tier_multiplier.clamp(0.5, 1.5);
        self.preheat_aggressiveness = self.preheat_aggressiveness.clamp(-1.2, 1.2);
        self.coasting_reduction = self.coasting_reduction.clamp(-1.2, 1.2);
        self.boost_increase = self.boost_increase.clamp(-1.2, 1.2);
        self.overall_confidence = self.overall_confidence.clamp(0.0, 1.0);
    }

    /// Blend toward the built-in default while confidence is still low
    /// (spec §4.6: "never a binary cutoff").
    pub fn blended(&self) -> AdaptiveParameters {
        if self.overall_confidence >= 0.3 {
            return *self;
        }
        let default = AdaptiveParameters::default();
        let w = 0.5;
        AdaptiveParameters {
            price_weight_summer: lerp(default.price_weight_summer, self.price_weight_summer, w),
            price_weight_winter: lerp(default.price_weight_winter, self.price_weight_winter, w),
            price_weight_transition: lerp(
                default.price_weight_transition,
                self.price_weight_transition,
                w,
            ),
            cheap_tier_multiplier: lerp(
                default.cheap_tier_multiplier,
                self.cheap_tier_multiplier,
                w,
            ),
            preheat_aggressiveness: lerp(
                default.preheat_aggressiveness,
                self.preheat_aggressiveness,
                w,
            ),
            coasting_reduction: lerp(default.coasting_reduction, self.coasting_reduction, w),
            boost_increase: lerp(default.boost_increase, self.boost_increase, w),
            cop_thresholds: self.cop_thresholds,
            learning_cycles: self.learning_cycles,
            overall_confidence: self.overall_confidence,
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_confidence_blends_toward_default() {
        let mut params = AdaptiveParameters::default();
        params.preheat_aggressiveness = 1.0;
        params.overall_confidence = 0.0;
        let blended = params.blended();
        assert_eq!(blended.preheat_aggressiveness, 0.5);
    }

    #[test]
    fn high_confidence_passes_through() {
        let mut params = AdaptiveParameters::default();
        params.preheat_aggressiveness = 1.0;
        params.overall_confidence = 0.5;
        let blended = params.blended();
        assert_eq!(blended.preheat_aggressiveness, 1.0);
    }

    #[test]
    fn clamp_enforces_bounds() {
        let mut params = AdaptiveParameters {
            price_weight_summer: 2.0,
            boost_increase: -5.0,
            ..AdaptiveParameters::default()
        };
        params.clamp();
        assert_eq!(params.price_weight_summer, 0.9);
        assert_eq!(params.boost_increase, -1.2);
    }
}
