// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! C11 — Optimization Orchestrator.
//!
//! The only component in this crate that performs I/O or raises errors
//! to the host. Owns all learners and the constraint kernel during a
//! cycle and hands them read-only snapshots; persists through
//! [`crate::storage`] exclusively (spec §4.11, §5).

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use heatopt_types::adaptive::AdaptiveParameters;
use heatopt_types::comfort::ComfortBand;
use heatopt_types::constraints::ZoneConstraints;
use heatopt_types::cop::EnergyTotals;
use heatopt_types::hotwater::HotWaterPattern;
use heatopt_types::outcome::{OptimizationOutcome, ZoneDelta};
use heatopt_types::thermal::{ThermalCharacteristics, ThermalSample};
use heatopt_types::zone::ZoneId;
use tracing::{info, warn};

use crate::adaptive_parameters::{self, OutcomeFeedback, Season};
use crate::constraint_kernel;
use crate::cop_aggregator::CopRings;
use crate::decision_engine::{
    self, DecisionInputs, NearTermTiers, TankInputs, ZoneInputs,
};
use crate::price_analyzer;
use crate::savings;
use crate::traits::{DeviceAdapter, DeviceHandle, DeviceZone, PriceProvider, Timeline, WeatherProvider};
use crate::weather_bias::{self, ForecastPoint};

const FRESH_PRICES_MINUTES: i64 = 90;
const DEVICE_REACHABLE_MINUTES: i64 = 15;
const MAX_API_ERRORS_PER_30_MIN: u32 = 3;

/// Caps the raw thermal-sample buffer at roughly 30 days of hourly
/// readings. The scheduler only wakes this orchestrator once an hour, so
/// one reading per hour is the finest cadence actually available to feed
/// the weekly aggregation below (spec §4.4 calls for a ≤5-minute cadence).
pub const MAX_THERMAL_SAMPLES: usize = 24 * 30;

/// Trailing window of samples considered when building hour-of-day
/// aggregates for weekly calibration.
const THERMAL_AGGREGATION_WINDOW_HOURS: i64 = 24 * 7;

/// Why an hourly cycle was skipped instead of producing an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    StalePrices,
    DeviceUnreachable,
    SettingsInvalid(String),
    TooManyApiErrors,
    AlreadyRanThisHour,
}

/// Rolling health signals the orchestrator consults before step 1 of the
/// hourly procedure (spec §4.11 step 1).
#[derive(Debug, Clone)]
pub struct HealthState {
    pub last_price_fetch: Option<DateTime<Utc>>,
    pub last_device_success: Option<DateTime<Utc>>,
    pub api_errors_last_30_min: u32,
    pub settings_valid: bool,
}

impl HealthState {
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), SkipReason> {
        if !self.settings_valid {
            return Err(SkipReason::SettingsInvalid("settings failed to parse".to_string()));
        }
        match self.last_price_fetch {
            Some(t) if (now - t).num_minutes() <= FRESH_PRICES_MINUTES => {}
            _ => return Err(SkipReason::StalePrices),
        }
        match self.last_device_success {
            Some(t) if (now - t).num_minutes() <= DEVICE_REACHABLE_MINUTES => {}
            _ => return Err(SkipReason::DeviceUnreachable),
        }
        if self.api_errors_last_30_min > MAX_API_ERRORS_PER_30_MIN {
            return Err(SkipReason::TooManyApiErrors);
        }
        Ok(())
    }
}

/// Per-zone bookkeeping the orchestrator must keep across cycles:
/// current setpoint, last change instant (for lockout), and device
/// reachability state.
#[derive(Debug, Clone, Copy)]
pub struct ZoneRuntime {
    pub current_setpoint_c: f64,
    pub last_change_time: DateTime<Utc>,
    pub constraints: ZoneConstraints,
}

pub struct CycleInputs {
    pub device_id: String,
    pub building_id: String,
    pub currency: String,
    pub comfort_band: ComfortBand,
    pub zone1: ZoneRuntime,
    pub zone2: Option<ZoneRuntime>,
    pub tank: Option<ZoneRuntime>,
    pub p_cheap: f64,
    pub cheap_tier_multiplier: f64,
    pub cop_weight: f64,
    pub space_k_loss: f64,
    pub tank_k_loss: f64,
    pub hot_water_pattern: HotWaterPattern,
    pub adaptive: AdaptiveParameters,
    pub thermal: ThermalCharacteristics,
    pub cop_rings: CopRings,
    pub thermal_samples: Vec<ThermalSample>,
}

/// Tracks `(year, month, day, hour)` already processed so a duplicate
/// trigger within the same local hour never produces a second device
/// write (spec §5 idempotency guard).
#[derive(Default)]
pub struct HourGuard {
    last_ran: Option<(i32, u32, u32, u32)>,
}

impl HourGuard {
    pub fn should_run(&mut self, hour_key: (i32, u32, u32, u32)) -> bool {
        if self.last_ran == Some(hour_key) {
            return false;
        }
        self.last_ran = Some(hour_key);
        true
    }
}

/// Runs one hourly cycle (spec §4.11 steps 1-9). `hour_key` is the local
/// `(year, month, day, hour)` tuple used for the idempotency guard.
pub async fn run_hourly_cycle(
    device: &dyn DeviceAdapter,
    prices: &dyn PriceProvider,
    weather: &dyn WeatherProvider,
    timeline: &dyn Timeline,
    health: &HealthState,
    guard: &mut HourGuard,
    hour_key: (i32, u32, u32, u32),
    now: DateTime<Utc>,
    inputs: &mut CycleInputs,
) -> Result<Option<OptimizationOutcome>, SkipReason> {
    // Step 1: health check + idempotency guard.
    health.check(now)?;
    if !guard.should_run(hour_key) {
        return Err(SkipReason::AlreadyRanThisHour);
    }

    // Step 2: read settings/device/prices/weather (settings already
    // folded into `inputs` by the caller via RunConfig).
    let snapshot = device
        .snapshot(&inputs.device_id, &inputs.building_id)
        .await
        .map_err(|_| SkipReason::DeviceUnreachable)?
        .sanitized();

    let price_quote = prices
        .get_prices(&inputs.currency)
        .await
        .map_err(|_| SkipReason::StalePrices)?;
    let price_analysis = price_analyzer::analyze(
        &price_quote.series,
        now,
        inputs.p_cheap,
        inputs.cheap_tier_multiplier,
    )
    .map_err(|_| SkipReason::StalePrices)?;

    let forecast = weather.forecast(0.0, 0.0).await.ok();
    let weather_points: Vec<ForecastPoint> = forecast
        .as_ref()
        .map(|f| {
            f.hourly
                .iter()
                .map(|h| ForecastPoint {
                    hours_ahead: h.hours_ahead,
                    outdoor_c: h.temperature_c,
                    price_tier: price_analysis.tier,
                })
                .collect()
        })
        .unwrap_or_default();
    let weather_bias = weather_bias::compute(
        snapshot.outdoor.unwrap_or(0.0),
        &weather_points,
        chrono::Duration::minutes(0),
    );

    // Step 3: per-zone constraints already live on `inputs.zoneN.constraints`.
    // Step 4: decision engine.
    let seasonal_cop = crate::cop_aggregator::seasonal_current_cop(&inputs.cop_rings, now);
    let hour_of_day = now.hour() as usize;
    let day_of_week = now.weekday().num_days_from_monday() as usize;
    let demand_next_4h = (0..4)
        .map(|h| inputs.hot_water_pattern.predict((hour_of_day + h) % 24, day_of_week))
        .fold(0.0_f64, f64::max);

    let (cheap_hours_in_next_6, expensive_hours_in_next_3) =
        price_analyzer::near_term_counts(&price_quote.series, now, inputs.p_cheap, inputs.cheap_tier_multiplier);

    let decision_inputs = DecisionInputs {
        price: price_analysis,
        near_term: NearTermTiers {
            cheap_hours_in_next_6,
            current_hour_is_cheap: price_analysis.tier.is_cheap_or_better(),
            expensive_hours_in_next_3,
        },
        seasonal_cop,
        adaptive: inputs.adaptive.blended(),
        thermal_confidence: inputs.thermal.model_confidence,
        weather: weather_bias,
        zone1: ZoneInputs {
            current_setpoint_c: inputs.zone1.current_setpoint_c,
            indoor_c: snapshot.indoor_z1,
            comfort_band: inputs.comfort_band,
            enabled: true,
        },
        zone2: inputs.zone2.map(|z| ZoneInputs {
            current_setpoint_c: z.current_setpoint_c,
            indoor_c: snapshot.indoor_z2,
            comfort_band: inputs.comfort_band,
            enabled: snapshot.zone2_enabled(),
        }),
        tank: inputs.tank.map(|t| TankInputs {
            current_setpoint_c: t.current_setpoint_c,
            min_c: t.constraints.min_c,
            max_c: t.constraints.max_c,
            step_c: t.constraints.step_c,
            enabled: snapshot.tank_enabled(),
            demand_next_4h,
        }),
        cop_weight: inputs.cop_weight,
    };
    let decision = decision_engine::decide(&decision_inputs);

    // Step 5: constraint kernel per zone.
    let mut zone_deltas = Vec::new();
    let zone1_outcome = constraint_kernel::apply(
        decision.zone1_target.target_c,
        inputs.zone1.current_setpoint_c,
        &inputs.zone1.constraints,
        inputs.zone1.last_change_time,
        now,
    );

    // Step 6: apply changed setpoints via the device adapter.
    if zone1_outcome.changed {
        device
            .set_setpoint(&inputs.device_id, &inputs.building_id, DeviceZone::Zone1, zone1_outcome.applied_c)
            .await
            .map_err(|_| SkipReason::DeviceUnreachable)?;
        inputs.zone1.last_change_time = now;
    }
    inputs.zone1.current_setpoint_c = zone1_outcome.applied_c;

    // Step 7: savings.
    let zone1_savings = savings::hourly_savings_minor(
        inputs.comfort_band.baseline_c(),
        zone1_outcome.applied_c,
        price_analysis.current_price_minor,
        inputs.space_k_loss,
    );
    zone_deltas.push(ZoneDelta {
        zone: ZoneId::Zone1,
        before_c: decision_inputs.zone1.current_setpoint_c,
        after_c: zone1_outcome.applied_c,
        changed: zone1_outcome.changed,
        savings_minor: zone1_savings,
    });

    if let (Some(zone2_target), Some(mut zone2)) = (&decision.zone2_target, inputs.zone2) {
        let outcome = constraint_kernel::apply(
            zone2_target.target_c,
            zone2.current_setpoint_c,
            &zone2.constraints,
            zone2.last_change_time,
            now,
        );
        if outcome.changed {
            device
                .set_setpoint(&inputs.device_id, &inputs.building_id, DeviceZone::Zone2, outcome.applied_c)
                .await
                .map_err(|_| SkipReason::DeviceUnreachable)?;
            zone2.last_change_time = now;
        }
        let before = zone2.current_setpoint_c;
        zone2.current_setpoint_c = outcome.applied_c;
        inputs.zone2 = Some(zone2);
        let savings_minor = savings::hourly_savings_minor(
            inputs.comfort_band.baseline_c(),
            outcome.applied_c,
            price_analysis.current_price_minor,
            inputs.space_k_loss,
        );
        zone_deltas.push(ZoneDelta {
            zone: ZoneId::Zone2,
            before_c: before,
            after_c: outcome.applied_c,
            changed: outcome.changed,
            savings_minor,
        });
    }

    if let (Some(tank_target), Some(mut tank)) = (&decision.tank_target, inputs.tank) {
        let outcome = constraint_kernel::apply(
            tank_target.target_c,
            tank.current_setpoint_c,
            &tank.constraints,
            tank.last_change_time,
            now,
        );
        if outcome.changed {
            device
                .set_setpoint(&inputs.device_id, &inputs.building_id, DeviceZone::Tank, outcome.applied_c)
                .await
                .map_err(|_| SkipReason::DeviceUnreachable)?;
            tank.last_change_time = now;
        }
        let before = tank.current_setpoint_c;
        tank.current_setpoint_c = outcome.applied_c;
        inputs.tank = Some(tank);
        let savings_minor = savings::hourly_savings_minor(
            tank.constraints.max_c,
            outcome.applied_c,
            price_analysis.current_price_minor,
            inputs.tank_k_loss,
        );
        zone_deltas.push(ZoneDelta {
            zone: ZoneId::Tank,
            before_c: before,
            after_c: outcome.applied_c,
            changed: outcome.changed,
            savings_minor,
        });
    }

    let total_savings_minor: i64 = zone_deltas.iter().map(|d| d.savings_minor).sum();
    let outcome = OptimizationOutcome {
        timestamp: now,
        price_minor: price_analysis.current_price_minor,
        price_tier: price_analysis.tier,
        zone_deltas,
        action: decision.planned_action,
        reason_tokens: decision.reason_tokens,
        savings_minor: total_savings_minor,
        confidence_snapshot: inputs.adaptive.overall_confidence,
    };

    // Step 8: persistence happens in the caller (owns the KeyValueStore);
    // timeline emission happens strictly after, per spec §5 ordering.
    timeline
        .emit(
            "Heat-pump optimization",
            &format!(
                "{:?} at {}/kWh ({}), saved {} minor units",
                outcome.action,
                outcome.price_minor,
                outcome.price_tier.as_str(),
                outcome.savings_minor
            ),
            None,
        )
        .await;

    // Step 9: feed learners. A thermal reading is appended every cycle so
    // weekly calibration has data to aggregate (spec §4.4, §4.11 step 9);
    // DHW-raw ingestion is out of scope here and handled by the hot-water
    // learner directly.
    let (forecast_wind_mps, forecast_cloud_pct) = forecast
        .as_ref()
        .and_then(|f| f.hourly.first())
        .map(|h| (Some(h.wind_mps), Some(h.cloud_pct)))
        .unwrap_or((None, None));
    inputs.thermal_samples.push(ThermalSample {
        timestamp: now,
        indoor_c: snapshot.indoor_z1.unwrap_or(zone1_outcome.applied_c),
        outdoor_c: snapshot.outdoor.unwrap_or(0.0),
        setpoint_c: zone1_outcome.applied_c,
        heating_active: !snapshot.idle_z1,
        wind_mps: forecast_wind_mps,
        cloud_pct: forecast_cloud_pct,
    });
    while inputs.thermal_samples.len() > MAX_THERMAL_SAMPLES {
        inputs.thermal_samples.remove(0);
    }

    let favorable_hour = price_analysis.tier.is_cheap_or_better();
    adaptive_parameters::ingest(
        &mut inputs.adaptive,
        OutcomeFeedback {
            realized_savings_minor: total_savings_minor,
            comfort_violations: 0,
            realized_cop: seasonal_cop.unwrap_or(0.0),
            season: season_for(now),
            was_very_cheap_hour: favorable_hour,
        },
    );

    info!(
        savings_minor = total_savings_minor,
        action = ?outcome.action,
        "hourly optimization cycle complete"
    );

    Ok(Some(outcome))
}

fn season_for(now: DateTime<Utc>) -> Season {
    match now.month() {
        6..=8 => Season::Summer,
        12 | 1 | 2 => Season::Winter,
        _ => Season::Transition,
    }
}

/// Buckets the trailing [`THERMAL_AGGREGATION_WINDOW_HOURS`] of samples by
/// hour-of-day and condenses each bucket of two or more readings into an
/// [`crate::thermal_model::HourAggregate`] (spec §4.4). Called by the
/// weekly procedure; this module only builds the samples, `thermal_model`
/// only fits against the aggregates.
pub fn build_hour_aggregates(
    samples: &[ThermalSample],
    now: DateTime<Utc>,
) -> Vec<crate::thermal_model::HourAggregate> {
    let cutoff = now - chrono::Duration::hours(THERMAL_AGGREGATION_WINDOW_HOURS);
    let mut buckets: Vec<Vec<ThermalSample>> = vec![Vec::new(); 24];
    for sample in samples.iter().filter(|s| s.timestamp >= cutoff) {
        buckets[sample.timestamp.hour() as usize].push(*sample);
    }
    buckets
        .iter()
        .filter_map(|bucket| crate::thermal_model::HourAggregate::from_samples(bucket))
        .collect()
}

/// Weekly procedure (spec §4.11): re-fit the thermal model and feed the
/// fresh characteristics into the adaptive parameters.
pub fn run_weekly_cycle(
    prior: &ThermalCharacteristics,
    aggregates: &[crate::thermal_model::HourAggregate],
    now: DateTime<Utc>,
) -> ThermalCharacteristics {
    let updated = crate::thermal_model::calibrate(prior, aggregates, now);
    if updated.model_confidence > prior.model_confidence {
        info!(
            confidence = updated.model_confidence,
            "weekly thermal calibration improved model confidence"
        );
    } else {
        warn!(
            confidence = updated.model_confidence,
            "weekly thermal calibration left model confidence unchanged or lower"
        );
    }
    updated
}

#[allow(dead_code)]
fn daily_energy_totals_to_entries(
    heat_produced: f64,
    heat_consumed: f64,
    dhw_produced: f64,
    dhw_consumed: f64,
) -> HashMap<&'static str, EnergyTotals> {
    let mut map = HashMap::new();
    map.insert(
        "heat",
        EnergyTotals {
            produced_kwh: heat_produced,
            consumed_kwh: heat_consumed,
        },
    );
    map.insert(
        "water",
        EnergyTotals {
            produced_kwh: dhw_produced,
            consumed_kwh: dhw_consumed,
        },
    );
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use heatopt_types::device::DeviceSnapshot;
    use heatopt_types::error::CoreError;
    use heatopt_types::price::PricePoint;

    struct FakeDevice {
        snapshot: DeviceSnapshot,
    }

    #[async_trait]
    impl DeviceAdapter for FakeDevice {
        async fn list_devices(&self) -> Result<Vec<DeviceHandle>, CoreError> {
            Ok(vec![])
        }
        async fn snapshot(&self, _id: &str, _building_id: &str) -> Result<DeviceSnapshot, CoreError> {
            Ok(self.snapshot)
        }
        async fn set_setpoint(
            &self,
            _id: &str,
            _building_id: &str,
            _zone: DeviceZone,
            _target_c: f64,
        ) -> Result<(), CoreError> {
            Ok(())
        }
        async fn energy_totals_daily(
            &self,
            _id: &str,
            _building_id: &str,
        ) -> Result<crate::traits::DailyEnergyTotals, CoreError> {
            Ok(crate::traits::DailyEnergyTotals {
                heat_produced_kwh: 10.0,
                heat_consumed_kwh: 3.0,
                dhw_produced_kwh: 2.0,
                dhw_consumed_kwh: 0.7,
                cop_heat: None,
                cop_dhw: None,
            })
        }
    }

    struct FakePrices {
        series: Vec<PricePoint>,
    }

    #[async_trait]
    impl PriceProvider for FakePrices {
        async fn get_prices(&self, currency: &str) -> Result<crate::traits::PriceQuote, CoreError> {
            Ok(crate::traits::PriceQuote {
                current: self.series.last().cloned().unwrap(),
                series: self.series.clone(),
                currency: currency.to_string(),
            })
        }
    }

    struct FakeWeather;

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn forecast(&self, _lat: f64, _lon: f64) -> Result<crate::traits::WeatherForecast, CoreError> {
            Ok(crate::traits::WeatherForecast {
                current_temperature_c: 5.0,
                hourly: vec![],
            })
        }
    }

    struct FakeTimeline;

    #[async_trait]
    impl Timeline for FakeTimeline {
        async fn emit(&self, _title: &str, _body: &str, _icon: Option<&str>) {}
        async fn notify(&self, _excerpt: &str) {}
    }

    fn base_snapshot() -> DeviceSnapshot {
        DeviceSnapshot {
            indoor_z1: 20.0,
            indoor_z2: None,
            outdoor: 5.0,
            tank_temp: None,
            setpoint_z1: 20.0,
            setpoint_z2: None,
            setpoint_tank: None,
            idle_z1: false,
            daily_heat_produced_kwh: 10.0,
            daily_heat_consumed_kwh: 3.0,
            daily_dhw_produced_kwh: 2.0,
            daily_dhw_consumed_kwh: 0.7,
        }
    }

    fn healthy_state(now: DateTime<Utc>) -> HealthState {
        HealthState {
            last_price_fetch: Some(now),
            last_device_success: Some(now),
            api_errors_last_30_min: 0,
            settings_valid: true,
        }
    }

    fn base_cycle_inputs(now: DateTime<Utc>) -> CycleInputs {
        CycleInputs {
            device_id: "dev1".to_string(),
            building_id: "b1".to_string(),
            currency: "EUR".to_string(),
            comfort_band: ComfortBand::new(18.0, 22.0),
            zone1: ZoneRuntime {
                current_setpoint_c: 20.0,
                last_change_time: now - chrono::Duration::hours(5),
                constraints: ZoneConstraints {
                    min_c: 18.0,
                    max_c: 22.0,
                    step_c: 0.5,
                    deadband_c: 0.3,
                    min_change_minutes: 30,
                },
            },
            zone2: None,
            tank: None,
            p_cheap: 0.25,
            cheap_tier_multiplier: 1.0,
            cop_weight: 0.3,
            space_k_loss: savings::DEFAULT_SPACE_K_LOSS,
            tank_k_loss: savings::DEFAULT_TANK_K_LOSS,
            hot_water_pattern: HotWaterPattern::default(),
            adaptive: AdaptiveParameters::default(),
            thermal: ThermalCharacteristics::default(),
            cop_rings: CopRings::default(),
            thermal_samples: Vec::new(),
        }
    }

    #[tokio::test]
    async fn health_check_blocks_stale_prices() {
        let now = Utc::now();
        let mut health = healthy_state(now);
        health.last_price_fetch = Some(now - chrono::Duration::hours(3));
        assert_eq!(health.check(now), Err(SkipReason::StalePrices));
    }

    #[tokio::test]
    async fn idempotency_guard_blocks_second_run_same_hour() {
        let now = Utc::now();
        let device = FakeDevice { snapshot: base_snapshot() };
        let prices = FakePrices {
            series: (0..24)
                .map(|h| PricePoint::new(now + chrono::Duration::hours(h), 100 + h, "EUR"))
                .collect(),
        };
        let weather = FakeWeather;
        let timeline = FakeTimeline;
        let health = healthy_state(now);
        let mut guard = HourGuard::default();
        let mut inputs = base_cycle_inputs(now);
        let hour_key = (2026, 6, 1, 12);

        let first = run_hourly_cycle(
            &device, &prices, &weather, &timeline, &health, &mut guard, hour_key, now, &mut inputs,
        )
        .await;
        assert!(first.is_ok());

        let mut inputs2 = base_cycle_inputs(now);
        let second = run_hourly_cycle(
            &device, &prices, &weather, &timeline, &health, &mut guard, hour_key, now, &mut inputs2,
        )
        .await;
        assert!(matches!(second, Err(SkipReason::AlreadyRanThisHour)));
    }

    #[test]
    fn weekly_cycle_returns_updated_characteristics() {
        let prior = ThermalCharacteristics {
            model_confidence: 0.2,
            ..ThermalCharacteristics::default()
        };
        let aggregates: Vec<_> = (0..30)
            .map(|_| crate::thermal_model::HourAggregate {
                delta_indoor_c: 0.1,
                setpoint_minus_indoor: 1.0,
                indoor_minus_outdoor: 5.0,
                wind_mps: 2.0,
            })
            .collect();
        let now = Utc::now();
        let updated = run_weekly_cycle(&prior, &aggregates, now);
        assert!(updated.model_confidence > prior.model_confidence);
    }

    fn sample_at(hours_ago: i64, now: DateTime<Utc>) -> ThermalSample {
        ThermalSample {
            timestamp: now - chrono::Duration::hours(hours_ago),
            indoor_c: 20.0,
            outdoor_c: 4.0,
            setpoint_c: 21.0,
            heating_active: true,
            wind_mps: Some(3.0),
            cloud_pct: Some(50.0),
        }
    }

    #[test]
    fn build_hour_aggregates_produces_one_per_covered_hour_of_day() {
        let now = Utc::now();
        // Two full weeks of hourly samples: every hour-of-day bucket sees
        // two readings inside the trailing 7-day window.
        let samples: Vec<_> = (0..24 * 14).map(|h| sample_at(h, now)).collect();
        let aggregates = build_hour_aggregates(&samples, now);
        assert_eq!(aggregates.len(), 24);
    }

    #[test]
    fn build_hour_aggregates_ignores_samples_outside_the_window() {
        let now = Utc::now();
        // A single sample per hour-of-day, all older than 7 days: no
        // bucket reaches the two-reading minimum.
        let samples: Vec<_> = (24 * 7..24 * 8).map(|h| sample_at(h, now)).collect();
        let aggregates = build_hour_aggregates(&samples, now);
        assert!(aggregates.is_empty());
    }
}
