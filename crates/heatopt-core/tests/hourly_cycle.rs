// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! End-to-end exercise of the hourly optimization cycle against
//! in-memory fakes for every collaborator trait, covering the health
//! gate, a multi-zone run with DHW, and the idempotency guard.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use heatopt_core::orchestrator::{
    run_hourly_cycle, CycleInputs, HealthState, HourGuard, SkipReason, ZoneRuntime,
};
use heatopt_core::savings;
use heatopt_core::traits::{
    DailyEnergyTotals, DeviceAdapter, DeviceHandle, DeviceZone, PriceProvider, PriceQuote, Timeline,
    WeatherForecast, WeatherProvider,
};
use heatopt_types::adaptive::AdaptiveParameters;
use heatopt_types::comfort::ComfortBand;
use heatopt_types::constraints::ZoneConstraints;
use heatopt_types::device::DeviceSnapshot;
use heatopt_types::error::CoreError;
use heatopt_types::hotwater::HotWaterPattern;
use heatopt_types::price::PricePoint;
use heatopt_types::thermal::ThermalCharacteristics;
use parking_lot::Mutex;

struct FakeDevice {
    snapshot: DeviceSnapshot,
    applied: Mutex<Vec<(DeviceZone, f64)>>,
}

impl FakeDevice {
    fn new(snapshot: DeviceSnapshot) -> Self {
        Self { snapshot, applied: Mutex::new(Vec::new()) }
    }
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
        zone: DeviceZone,
        target_c: f64,
    ) -> Result<(), CoreError> {
        self.applied.lock().push((zone, target_c));
        Ok(())
    }

    async fn energy_totals_daily(&self, _id: &str, _building_id: &str) -> Result<DailyEnergyTotals, CoreError> {
        Ok(DailyEnergyTotals {
            heat_produced_kwh: 12.0,
            heat_consumed_kwh: 4.0,
            dhw_produced_kwh: 3.0,
            dhw_consumed_kwh: 1.0,
            cop_heat: Some(3.0),
            cop_dhw: Some(3.0),
        })
    }
}

struct FakePrices {
    series: Vec<PricePoint>,
}

#[async_trait]
impl PriceProvider for FakePrices {
    async fn get_prices(&self, currency: &str) -> Result<PriceQuote, CoreError> {
        Ok(PriceQuote {
            current: self.series.last().cloned().unwrap(),
            series: self.series.clone(),
            currency: currency.to_string(),
        })
    }
}

struct EmptyPrices;

#[async_trait]
impl PriceProvider for EmptyPrices {
    async fn get_prices(&self, _currency: &str) -> Result<PriceQuote, CoreError> {
        Err(CoreError::StaleData("no prices available".to_string()))
    }
}

struct FakeWeather;

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn forecast(&self, _lat: f64, _lon: f64) -> Result<WeatherForecast, CoreError> {
        Ok(WeatherForecast { current_temperature_c: -2.0, hourly: vec![] })
    }
}

struct RecordingTimeline {
    events: Mutex<Vec<String>>,
}

impl RecordingTimeline {
    fn new() -> Self {
        Self { events: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl Timeline for RecordingTimeline {
    async fn emit(&self, title: &str, _body: &str, _icon: Option<&str>) {
        self.events.lock().push(title.to_string());
    }

    async fn notify(&self, excerpt: &str) {
        self.events.lock().push(excerpt.to_string());
    }
}

fn cheap_price_series(now: chrono::DateTime<Utc>) -> Vec<PricePoint> {
    (0..24)
        .map(|h| PricePoint::new(now + Duration::hours(h), 50, "EUR"))
        .collect()
}

fn zone_runtime(now: chrono::DateTime<Utc>, setpoint_c: f64) -> ZoneRuntime {
    ZoneRuntime {
        current_setpoint_c: setpoint_c,
        last_change_time: now - Duration::hours(6),
        constraints: ZoneConstraints {
            min_c: 17.0,
            max_c: 23.0,
            step_c: 0.5,
            deadband_c: 0.3,
            min_change_minutes: 30,
        },
    }
}

fn multi_zone_inputs(now: chrono::DateTime<Utc>) -> CycleInputs {
    CycleInputs {
        device_id: "dev1".to_string(),
        building_id: "house1".to_string(),
        currency: "EUR".to_string(),
        comfort_band: ComfortBand::new(19.0, 22.0),
        zone1: zone_runtime(now, 20.0),
        zone2: Some(zone_runtime(now, 19.0)),
        tank: Some(ZoneRuntime {
            current_setpoint_c: 45.0,
            last_change_time: now - Duration::hours(6),
            constraints: ZoneConstraints { min_c: 40.0, max_c: 55.0, step_c: 1.0, deadband_c: 1.0, min_change_minutes: 30 },
        }),
        p_cheap: 0.3,
        cheap_tier_multiplier: 1.0,
        cop_weight: 0.3,
        space_k_loss: savings::DEFAULT_SPACE_K_LOSS,
        tank_k_loss: savings::DEFAULT_TANK_K_LOSS,
        hot_water_pattern: HotWaterPattern::default(),
        adaptive: AdaptiveParameters::default(),
        thermal: ThermalCharacteristics::default(),
        cop_rings: heatopt_core::cop_aggregator::CopRings::default(),
        thermal_samples: Vec::new(),
    }
}

fn base_snapshot() -> DeviceSnapshot {
    DeviceSnapshot {
        indoor_z1: 20.0,
        indoor_z2: Some(19.0),
        outdoor: -3.0,
        tank_temp: Some(45.0),
        setpoint_z1: 20.0,
        setpoint_z2: Some(19.0),
        setpoint_tank: Some(45.0),
        idle_z1: false,
        daily_heat_produced_kwh: 12.0,
        daily_heat_consumed_kwh: 4.0,
        daily_dhw_produced_kwh: 3.0,
        daily_dhw_consumed_kwh: 1.0,
    }
}

fn healthy(now: chrono::DateTime<Utc>) -> HealthState {
    HealthState {
        last_price_fetch: Some(now),
        last_device_success: Some(now),
        api_errors_last_30_min: 0,
        settings_valid: true,
    }
}

#[tokio::test]
async fn cheap_hour_drives_a_multi_zone_cycle_to_an_outcome() {
    let now = Utc::now();
    let device = FakeDevice::new(base_snapshot());
    let prices = FakePrices { series: cheap_price_series(now) };
    let weather = FakeWeather;
    let timeline = RecordingTimeline::new();
    let health = healthy(now);
    let mut guard = HourGuard::default();
    let mut inputs = multi_zone_inputs(now);

    let outcome = run_hourly_cycle(
        &device, &prices, &weather, &timeline, &health, &mut guard, (2026, 1, 15, 8), now, &mut inputs,
    )
    .await
    .expect("cycle should succeed")
    .expect("a cheap hour should produce an outcome");

    assert_eq!(outcome.zone_deltas.len(), 3, "zone1, zone2 and tank should all report a delta");
    assert!(!timeline.events.lock().is_empty(), "timeline should receive at least one event");
    assert_eq!(inputs.thermal_samples.len(), 1, "a thermal reading should be recorded for the cycle");
}

#[tokio::test]
async fn stale_prices_skip_the_cycle_before_any_device_write() {
    let now = Utc::now();
    let device = FakeDevice::new(base_snapshot());
    let prices = EmptyPrices;
    let weather = FakeWeather;
    let timeline = RecordingTimeline::new();
    let mut health = healthy(now);
    health.last_price_fetch = Some(now - Duration::hours(4));
    let mut guard = HourGuard::default();
    let mut inputs = multi_zone_inputs(now);

    let result = run_hourly_cycle(
        &device, &prices, &weather, &timeline, &health, &mut guard, (2026, 1, 15, 9), now, &mut inputs,
    )
    .await;

    assert_eq!(result, Err(SkipReason::StalePrices));
    assert!(device.applied.lock().is_empty());
    assert!(timeline.events.lock().is_empty());
}

#[tokio::test]
async fn invalid_settings_skip_before_touching_adapters() {
    let now = Utc::now();
    let device = FakeDevice::new(base_snapshot());
    let prices = FakePrices { series: cheap_price_series(now) };
    let weather = FakeWeather;
    let timeline = RecordingTimeline::new();
    let mut health = healthy(now);
    health.settings_valid = false;
    let mut guard = HourGuard::default();
    let mut inputs = multi_zone_inputs(now);

    let result = run_hourly_cycle(
        &device, &prices, &weather, &timeline, &health, &mut guard, (2026, 1, 15, 10), now, &mut inputs,
    )
    .await;

    assert!(matches!(result, Err(SkipReason::SettingsInvalid(_))));
    assert!(device.applied.lock().is_empty());
}

#[tokio::test]
async fn a_second_trigger_in_the_same_hour_is_ignored() {
    let now = Utc::now();
    let device = FakeDevice::new(base_snapshot());
    let prices = FakePrices { series: cheap_price_series(now) };
    let weather = FakeWeather;
    let timeline = RecordingTimeline::new();
    let health = healthy(now);
    let mut guard = HourGuard::default();
    let hour_key = (2026, 1, 15, 11);

    let mut first_inputs = multi_zone_inputs(now);
    run_hourly_cycle(&device, &prices, &weather, &timeline, &health, &mut guard, hour_key, now, &mut first_inputs)
        .await
        .unwrap();

    let mut second_inputs = multi_zone_inputs(now);
    let second = run_hourly_cycle(
        &device, &prices, &weather, &timeline, &health, &mut guard, hour_key, now, &mut second_inputs,
    )
    .await;

    assert_eq!(second, Err(SkipReason::AlreadyRanThisHour));
}
