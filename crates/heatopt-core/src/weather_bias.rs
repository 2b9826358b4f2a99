// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! C8 — Weather Bias.
//!
//! A bounded preheat/coast offset derived from the short-horizon forecast
//! (spec §4.8). Missing or stale forecasts contribute zero bias and the
//! `no_weather` reason token.

use heatopt_types::price::PriceTier;

const MAX_PREHEAT_BIAS_C: f64 = 0.5;
const MAX_COAST_BIAS_C: f64 = -0.3;
const TOTAL_BIAS_CLAMP_C: f64 = 0.7;
const FORECAST_STALE_AFTER_HOURS: i64 = 1;
const NEAR_TERM_HOURS: i64 = 6;
const DROP_THRESHOLD_C: f64 = 3.0;
const RISE_THRESHOLD_C: f64 = 3.0;

#[derive(Debug, Clone, Copy)]
pub struct ForecastPoint {
    pub hours_ahead: i64,
    pub outdoor_c: f64,
    pub price_tier: PriceTier,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherBiasResult {
    pub bias_c: f64,
    pub reason_token: Option<&'static str>,
}

/// `forecast` must be sorted by `hours_ahead` ascending and cover at
/// least the next [`NEAR_TERM_HOURS`] hours for a non-zero bias.
/// `forecast_age` is how old the forecast fetch itself is.
pub fn compute(
    current_outdoor_c: f64,
    forecast: &[ForecastPoint],
    forecast_age: chrono::Duration,
) -> WeatherBiasResult {
    if forecast.is_empty() || forecast_age.num_hours() > FORECAST_STALE_AFTER_HOURS {
        return WeatherBiasResult {
            bias_c: 0.0,
            reason_token: Some("no_weather"),
        };
    }

    let near_term: Vec<&ForecastPoint> = forecast
        .iter()
        .filter(|p| p.hours_ahead >= 0 && p.hours_ahead <= NEAR_TERM_HOURS)
        .collect();

    let mut bias = 0.0_f64;

    let will_drop_during_cheap = near_term.iter().any(|p| {
        p.price_tier.is_cheap_or_better() && (current_outdoor_c - p.outdoor_c) >= DROP_THRESHOLD_C
    });
    if will_drop_during_cheap {
        bias += MAX_PREHEAT_BIAS_C;
    }

    let near_expensive: Vec<&&ForecastPoint> = near_term
        .iter()
        .filter(|p| p.hours_ahead <= 3 && p.price_tier.is_expensive_or_worse())
        .collect();
    let will_rise_during_expensive = near_expensive
        .iter()
        .any(|p| (p.outdoor_c - current_outdoor_c) >= RISE_THRESHOLD_C);
    if will_rise_during_expensive {
        bias += MAX_COAST_BIAS_C;
    }

    WeatherBiasResult {
        bias_c: bias.clamp(-TOTAL_BIAS_CLAMP_C, TOTAL_BIAS_CLAMP_C),
        reason_token: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_forecast_yields_zero_bias_and_reason_token() {
        let result = compute(5.0, &[], chrono::Duration::minutes(30));
        assert_eq!(result.bias_c, 0.0);
        assert_eq!(result.reason_token, Some("no_weather"));
    }

    #[test]
    fn stale_forecast_yields_zero_bias() {
        let forecast = vec![ForecastPoint {
            hours_ahead: 1,
            outdoor_c: -5.0,
            price_tier: PriceTier::Cheap,
        }];
        let result = compute(5.0, &forecast, chrono::Duration::hours(3));
        assert_eq!(result.bias_c, 0.0);
    }

    #[test]
    fn cold_snap_during_cheap_window_adds_preheat_bias() {
        let forecast = vec![ForecastPoint {
            hours_ahead: 2,
            outdoor_c: -5.0,
            price_tier: PriceTier::Cheap,
        }];
        let result = compute(2.0, &forecast, chrono::Duration::minutes(10));
        assert_eq!(result.bias_c, MAX_PREHEAT_BIAS_C);
        assert!(result.reason_token.is_none());
    }

    #[test]
    fn warm_snap_during_expensive_window_adds_coast_bias() {
        let forecast = vec![ForecastPoint {
            hours_ahead: 2,
            outdoor_c: 10.0,
            price_tier: PriceTier::Expensive,
        }];
        let result = compute(5.0, &forecast, chrono::Duration::minutes(10));
        assert_eq!(result.bias_c, MAX_COAST_BIAS_C);
    }

    #[test]
    fn total_bias_is_clamped_to_0_7() {
        let forecast = vec![
            ForecastPoint {
                hours_ahead: 1,
                outdoor_c: -10.0,
                price_tier: PriceTier::VeryCheap,
            },
            ForecastPoint {
                hours_ahead: 2,
                outdoor_c: 20.0,
                price_tier: PriceTier::VeryExpensive,
            },
        ];
        let result = compute(5.0, &forecast, chrono::Duration::minutes(10));
        assert!(result.bias_c.abs() <= TOTAL_BIAS_CLAMP_C);
    }
}
