// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! C4 — Thermal Model.
//!
//! Online estimation of heating/cooling rates, heat loss, thermal mass,
//! and a confidence score, re-fit weekly from hour-aggregated samples
//! (spec §4.4). Fitting is closed-form least squares, not iterative.

use chrono::{DateTime, Utc};
use heatopt_types::thermal::{ThermalCharacteristics, ThermalSample};

pub const MIN_AGGREGATES_FOR_CALIBRATION: usize = 24;
const CONFIDENCE_DECAY_ON_INSUFFICIENT_DATA: f64 = 0.05;
const FIT_WEIGHT: f64 = 0.2;
const PRIOR_WEIGHT: f64 = 0.8;

/// One hour-aggregate: mean indoor delta against its regressors for that
/// hour. Produced by condensing raw [`ThermalSample`]s older than 30 days
/// (spec §4.4); the orchestrator builds these, this module only fits
/// against them.
#[derive(Debug, Clone, Copy)]
pub struct HourAggregate {
    pub delta_indoor_c: f64,
    pub setpoint_minus_indoor: f64,
    pub indoor_minus_outdoor: f64,
    pub wind_mps: f64,
}

impl HourAggregate {
    pub fn from_samples(samples: &[ThermalSample]) -> Option<Self> {
        if samples.len() < 2 {
            return None;
        }
        let first = samples.first()?;
        let last = samples.last()?;
        let delta_indoor_c = last.indoor_c - first.indoor_c;
        let mean = |f: fn(&ThermalSample) -> f64| {
            samples.iter().map(f).sum::<f64>() / samples.len() as f64
        };
        let setpoint_minus_indoor = mean(|s| s.setpoint_c - s.indoor_c);
        let indoor_minus_outdoor = mean(|s| s.indoor_c - s.outdoor_c);
        let wind_mps = samples
            .iter()
            .filter_map(|s| s.wind_mps)
            .sum::<f64>()
            / samples.iter().filter(|s| s.wind_mps.is_some()).count().max(1) as f64;
        Some(Self {
            delta_indoor_c,
            setpoint_minus_indoor,
            indoor_minus_outdoor,
            wind_mps,
        })
    }
}

/// Ordinary-least-squares fit of
/// `delta_indoor ~= alpha*(setpoint-indoor) - beta*(indoor-outdoor) - gamma*wind`
/// using the normal equations over three regressors. Returns
/// `(alpha, beta, gamma)`.
fn least_squares_fit(aggregates: &[HourAggregate]) -> (f64, f64, f64) {
    let n = aggregates.len() as f64;
    // Build X^T X (3x3, symmetric) and X^T y (3) by hand; closed-form,
    // no external linear-algebra dependency needed for a 3-regressor fit.
    let mut xtx = [[0.0_f64; 3]; 3];
    let mut xty = [0.0_f64; 3];
    for a in aggregates {
        let x = [a.setpoint_minus_indoor, -a.indoor_minus_outdoor, -a.wind_mps];
        for i in 0..3 {
            xty[i] += x[i] * a.delta_indoor_c;
            for j in 0..3 {
                xtx[i][j] += x[i] * x[j];
            }
        }
    }
    // Ridge-style regularization on the diagonal keeps the 3x3 solve
    // well-posed when a regressor is nearly constant across the window
    // (e.g. little wind data).
    let ridge = 1e-6 * n.max(1.0);
    for i in 0..3 {
        xtx[i][i] += ridge;
    }
    solve_3x3(xtx, xty).unwrap_or((0.0, 0.0, 0.0))
}

fn solve_3x3(mut a: [[f64; 3]; 3], mut b: [f64; 3]) -> Option<(f64, f64, f64)> {
    for col in 0..3 {
        let mut pivot_row = col;
        for row in (col + 1)..3 {
            if a[row][col].abs() > a[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        if a[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);
        let pivot = a[col][col];
        for k in 0..3 {
            a[col][k] /= pivot;
        }
        b[col] /= pivot;
        for row in 0..3 {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            for k in 0..3 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    Some((b[0], b[1], b[2]))
}

/// Weekly calibration (spec §4.4). Leaves coefficients unchanged and
/// lowers confidence by 5% when fewer than
/// [`MIN_AGGREGATES_FOR_CALIBRATION`] aggregates are available; otherwise
/// fits, blends 20% fit / 80% prior, and bumps confidence toward 1.0
/// proportional to sample count.
pub fn calibrate(
    prior: &ThermalCharacteristics,
    aggregates: &[HourAggregate],
    now: DateTime<Utc>,
) -> ThermalCharacteristics {
    if aggregates.len() < MIN_AGGREGATES_FOR_CALIBRATION {
        return ThermalCharacteristics {
            model_confidence: (prior.model_confidence - CONFIDENCE_DECAY_ON_INSUFFICIENT_DATA)
                .max(0.0),
            ..*prior
        };
    }

    let (alpha, beta, gamma) = least_squares_fit(aggregates);
    let cooling_rate = aggregates
        .iter()
        .map(|a| a.indoor_minus_outdoor)
        .sum::<f64>()
        / aggregates.len() as f64;
    let thermal_mass = aggregates
        .iter()
        .map(|a| a.delta_indoor_c.abs())
        .sum::<f64>()
        / aggregates.len() as f64;

    let blend = |fit: f64, prior: f64| FIT_WEIGHT * fit + PRIOR_WEIGHT * prior;

    // Confidence climbs toward 1.0 with sample count, saturating well
    // past the minimum so a single calibration at the threshold doesn't
    // already claim full trust.
    let sample_bonus = ((aggregates.len() as f64 - MIN_AGGREGATES_FOR_CALIBRATION as f64) / 100.0)
        .clamp(0.0, 1.0);
    let new_confidence = (prior.model_confidence + 0.1 + 0.2 * sample_bonus).min(1.0);

    ThermalCharacteristics {
        heating_rate_per_hour: blend(alpha, prior.heating_rate_per_hour),
        cooling_rate_per_hour: blend(cooling_rate, prior.cooling_rate_per_hour),
        outdoor_impact: blend(beta, prior.outdoor_impact),
        wind_impact: blend(gamma, prior.wind_impact),
        thermal_mass: blend(thermal_mass, prior.thermal_mass),
        last_updated: now,
        model_confidence: new_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn diurnal_aggregates(count: usize) -> Vec<HourAggregate> {
        (0..count)
            .map(|i| {
                let phase = (i % 24) as f64 / 24.0 * std::f64::consts::TAU;
                HourAggregate {
                    delta_indoor_c: phase.sin() * 0.2,
                    setpoint_minus_indoor: 1.0 + 0.1 * phase.cos(),
                    indoor_minus_outdoor: 5.0 + 5.0 * phase.sin(),
                    wind_mps: 2.0 + phase.cos(),
                }
            })
            .collect()
    }

    #[test]
    fn insufficient_aggregates_leaves_coefficients_unchanged_and_decays_confidence() {
        let prior = ThermalCharacteristics {
            heating_rate_per_hour: 1.23,
            model_confidence: 0.5,
            ..ThermalCharacteristics::default()
        };
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 5, 0).unwrap();
        let updated = calibrate(&prior, &diurnal_aggregates(10), now);
        assert_eq!(updated.heating_rate_per_hour, 1.23);
        assert_eq!(updated.model_confidence, 0.45);
    }

    #[test]
    fn confidence_decay_is_bounded_below_by_zero() {
        let prior = ThermalCharacteristics {
            model_confidence: 0.01,
            ..ThermalCharacteristics::default()
        };
        let now = Utc::now();
        let updated = calibrate(&prior, &diurnal_aggregates(5), now);
        assert_eq!(updated.model_confidence, 0.0);
    }

    /// S7 — confidence persists (increases) after a successful
    /// calibration with enough aggregated samples.
    #[test]
    fn s7_confidence_increases_after_calibration_with_enough_samples() {
        let prior = ThermalCharacteristics {
            model_confidence: 0.25,
            ..ThermalCharacteristics::default()
        };
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 2, 0, 0).unwrap();
        let updated = calibrate(&prior, &diurnal_aggregates(48), now);
        assert!(updated.model_confidence > 0.25);
        assert_eq!(updated.last_updated, now);
    }

    #[test]
    fn hour_aggregate_needs_at_least_two_samples() {
        let sample = ThermalSample {
            timestamp: Utc::now(),
            indoor_c: 20.0,
            outdoor_c: 5.0,
            setpoint_c: 21.0,
            heating_active: true,
            wind_mps: Some(1.0),
            cloud_pct: None,
        };
        assert!(HourAggregate::from_samples(&[sample]).is_none());
    }
}
