// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! C3 — Price Analyzer.
//!
//! Percentile classification over a forward price window. Two window
//! shapes are exposed: [`analyze`], the rolling "next 24 wall-clock
//! hours" window the decision engine calls every cycle (always as many
//! hour-aligned UTC points as the series provides for that span), and
//! [`analyze_local_day`], which buckets by the IANA-timezone calendar day
//! and therefore sees 23 or 25 points on a DST transition day (spec §4.3,
//! §8 scenario S5).

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use heatopt_types::error::CoreError;
use heatopt_types::price::{PriceAnalysis, PriceTier, PricePoint};

use crate::time::local_day_bounds;

const STALE_AFTER_HOURS: i64 = 2;

fn finite_points<'a>(series: &'a [PricePoint]) -> impl Iterator<Item = &'a PricePoint> {
    series.iter().filter(|p| (p.price_minor as f64).is_finite())
}

fn classify(percentile_rank: f64, p_cheap: f64, cheap_tier_multiplier: f64) -> PriceTier {
    let m = cheap_tier_multiplier;
    if percentile_rank <= p_cheap * m {
        PriceTier::VeryCheap
    } else if percentile_rank <= 2.0 * p_cheap {
        PriceTier::Cheap
    } else if percentile_rank >= 1.0 - p_cheap {
        PriceTier::VeryExpensive
    } else if percentile_rank >= 1.0 - 2.0 * p_cheap {
        PriceTier::Expensive
    } else {
        PriceTier::Normal
    }
}

fn percentile_rank_of(current_minor: i64, window: &[i64]) -> f64 {
    if window.len() <= 1 {
        return 0.5;
    }
    let below = window.iter().filter(|&&p| p < current_minor).count();
    below as f64 / (window.len() - 1) as f64
}

fn analyze_window(
    now: DateTime<Utc>,
    window: &[PricePoint],
    p_cheap: f64,
    cheap_tier_multiplier: f64,
) -> Result<PriceAnalysis, CoreError> {
    let current = window
        .iter()
        .filter(|p| p.time <= now)
        .max_by_key(|p| p.time)
        .or_else(|| window.iter().min_by_key(|p| p.time))
        .ok_or_else(|| CoreError::StaleData("empty price window".to_string()))?;

    if (now - current.time).num_hours() > STALE_AFTER_HOURS {
        return Err(CoreError::StaleData(format!(
            "newest price point is {}h old",
            (now - current.time).num_hours()
        )));
    }

    let prices: Vec<i64> = finite_points(window).map(|p| p.price_minor).collect();
    if prices.is_empty() {
        return Err(CoreError::StaleData("no finite price points".to_string()));
    }
    let min_minor = *prices.iter().min().unwrap();
    let max_minor = *prices.iter().max().unwrap();
    let rank = percentile_rank_of(current.price_minor, &prices);
    let tier = classify(rank, p_cheap, cheap_tier_multiplier);

    Ok(PriceAnalysis {
        current_price_minor: current.price_minor,
        percentile_rank: rank,
        tier,
        window_min_minor: min_minor,
        window_max_minor: max_minor,
        window_len: prices.len(),
    })
}

/// Rolling `[now, now + 24h)` window, used by the hourly decision cycle.
pub fn analyze(
    series: &[PricePoint],
    now: DateTime<Utc>,
    p_cheap: f64,
    cheap_tier_multiplier: f64,
) -> Result<PriceAnalysis, CoreError> {
    let horizon = now + chrono::Duration::hours(24);
    let window: Vec<PricePoint> = series
        .iter()
        .filter(|p| p.time >= now && p.time < horizon)
        .cloned()
        .collect();
    analyze_window(now, &window, p_cheap, cheap_tier_multiplier)
}

/// Counts cheap-or-better hours in the next 6 and expensive-or-worse hours
/// in the next 3, classifying each future hour-aligned point against the
/// same rolling 24h window used for the current hour's analysis. Feeds the
/// Decision Engine's thermal-planning bias (spec §4.9 step 4).
pub fn near_term_counts(
    series: &[PricePoint],
    now: DateTime<Utc>,
    p_cheap: f64,
    cheap_tier_multiplier: f64,
) -> (u32, u32) {
    let horizon = now + chrono::Duration::hours(24);
    let window: Vec<i64> = series
        .iter()
        .filter(|p| p.time >= now && p.time < horizon)
        .filter(|p| (p.price_minor as f64).is_finite())
        .map(|p| p.price_minor)
        .collect();
    if window.is_empty() {
        return (0, 0);
    }

    let mut cheap_hours_in_next_6 = 0;
    let mut expensive_hours_in_next_3 = 0;
    for h in 1..=6 {
        let target = now + chrono::Duration::hours(h);
        let Some(point) = series.iter().find(|p| p.time == target) else {
            continue;
        };
        let rank = percentile_rank_of(point.price_minor, &window);
        let tier = classify(rank, p_cheap, cheap_tier_multiplier);
        if tier.is_cheap_or_better() {
            cheap_hours_in_next_6 += 1;
        }
        if h <= 3 && tier.is_expensive_or_worse() {
            expensive_hours_in_next_3 += 1;
        }
    }
    (cheap_hours_in_next_6, expensive_hours_in_next_3)
}

/// Classifies against the IANA-timezone calendar day containing `now`.
/// Sees 23 points on a spring-forward day and 25 on a fall-back day
/// instead of always 24 (spec §8 S5).
pub fn analyze_local_day(
    series: &[PricePoint],
    now: DateTime<Utc>,
    tz: Tz,
    p_cheap: f64,
    cheap_tier_multiplier: f64,
) -> Result<PriceAnalysis, CoreError> {
    let (start, end) = local_day_bounds(now, tz);
    let window: Vec<PricePoint> = series
        .iter()
        .filter(|p| p.time >= start && p.time < end)
        .cloned()
        .collect();
    analyze_window(now, &window, p_cheap, cheap_tier_multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hourly_series(start: DateTime<Utc>, count: i64, prices: impl Fn(i64) -> i64) -> Vec<PricePoint> {
        (0..count)
            .map(|h| PricePoint::new(start + chrono::Duration::hours(h), prices(h), "EUR"))
            .collect()
    }

    #[test]
    fn rolling_window_covers_24_hours() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap();
        let series = hourly_series(now, 48, |h| 100 + h);
        let analysis = analyze(&series, now, 0.25, 1.0).unwrap();
        assert_eq!(analysis.window_len, 24);
    }

    #[test]
    fn cheapest_hour_ranks_near_zero_and_is_very_cheap() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let series = hourly_series(now, 24, |h| 100 + h * 10);
        let analysis = analyze(&series, now, 0.25, 1.0).unwrap();
        assert_eq!(analysis.percentile_rank, 0.0);
        assert_eq!(analysis.tier, PriceTier::VeryCheap);
    }

    #[test]
    fn most_expensive_hour_is_very_expensive() {
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let now = start + chrono::Duration::hours(23);
        let series = hourly_series(start, 24, |h| 100 + h * 10);
        let analysis = analyze(&series, now, 0.25, 1.0).unwrap();
        assert_eq!(analysis.percentile_rank, 1.0);
        assert_eq!(analysis.tier, PriceTier::VeryExpensive);
    }

    #[test]
    fn stale_prices_error_when_newest_point_too_old() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap();
        let series = hourly_series(now - chrono::Duration::hours(5), 3, |h| 100 + h);
        let err = analyze(&series, now, 0.25, 1.0).unwrap_err();
        assert!(matches!(err, CoreError::StaleData(_)));
    }

    /// S5 — DST spring-forward: the Berlin local day has 23 hourly
    /// points; a surrounding ordinary day has 24.
    #[test]
    fn s5_dst_spring_forward_local_day_has_23_points() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        // Spring-forward Sunday 2026-03-29: the local day spans
        // 2026-03-28T23:00Z .. 2026-03-29T22:00Z (23 UTC hours).
        let day_start_utc = Utc.with_ymd_and_hms(2026, 3, 28, 23, 0, 0).unwrap();
        let series = hourly_series(day_start_utc, 23, |h| 100 + h);
        let now = day_start_utc + chrono::Duration::hours(12);
        let analysis = analyze_local_day(&series, now, tz, 0.25, 1.0).unwrap();
        assert_eq!(analysis.window_len, 23);

        // A surrounding ordinary day sees 24.
        let prior_day_start = day_start_utc - chrono::Duration::hours(24);
        let prior_series = hourly_series(prior_day_start, 24, |h| 100 + h);
        let prior_now = prior_day_start + chrono::Duration::hours(12);
        let prior_analysis =
            analyze_local_day(&prior_series, prior_now, tz, 0.25, 1.0).unwrap();
        assert_eq!(prior_analysis.window_len, 24);
    }

    #[test]
    fn monotonicity_in_price_property() {
        // Higher percentile rank never yields a higher base target; here
        // we only check the analyzer's rank itself is monotonic in price.
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let series = hourly_series(now, 24, |h| 100 + h * 5);
        let cheap = analyze(&series, now, 0.25, 1.0).unwrap();
        let later_now = now + chrono::Duration::hours(23);
        let series2 = hourly_series(now, 24, |h| 100 + h * 5);
        let expensive = analyze(&series2, later_now, 0.25, 1.0).unwrap();
        assert!(expensive.percentile_rank >= cheap.percentile_rank);
    }

    #[test]
    fn near_term_counts_split_cheap_and_expensive_hours() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let prices = |h: i64| -> i64 {
            match h {
                0 => 500,
                1 => 991,
                2 => 992,
                3 => 993,
                4 => 11,
                5 => 12,
                6 => 13,
                _ => 100 + (h - 7) * 40,
            }
        };
        let series = hourly_series(now, 24, prices);
        let (cheap_in_6, expensive_in_3) = near_term_counts(&series, now, 0.25, 1.0);
        assert_eq!(cheap_in_6, 3, "hours 4-6 are the cheapest in the window");
        assert_eq!(expensive_in_3, 3, "hours 1-3 are the priciest in the window");
    }

    #[test]
    fn near_term_counts_is_zero_when_window_is_empty() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let (cheap_in_6, expensive_in_3) = near_term_counts(&[], now, 0.25, 1.0);
        assert_eq!(cheap_in_6, 0);
        assert_eq!(expensive_in_3, 0);
    }
}
