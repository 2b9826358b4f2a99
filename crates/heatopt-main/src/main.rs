// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

mod config;
mod version;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bevy_app::{prelude::*, ScheduleRunnerPlugin, TaskPoolPlugin};
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

use heatopt_adapters::{
    FileKeyValueStore, HttpDeviceAdapter, HttpTimeline, HttpWeatherProvider, RetailPriceProvider,
    TracingTimeline, WholesaleDayAheadPriceProvider,
};
use heatopt_core::config::PriceSource;
use heatopt_core::orchestrator::{run_hourly_cycle, run_weekly_cycle, CycleInputs, HealthState, HourGuard, ZoneRuntime};
use heatopt_core::scheduler::{self, Trigger};
use heatopt_core::storage::{self, KeyValueStore};
use heatopt_core::traits::{DeviceAdapter, PriceProvider, Timeline, WeatherProvider};
use heatopt_core::HeatOptCorePlugin;
use heatopt_types::adaptive::AdaptiveParameters;
use heatopt_types::constraints::ZoneConstraints;
use heatopt_types::hotwater::HotWaterPattern;
use heatopt_types::thermal::ThermalCharacteristics;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" => {
                println!("heatopt - heat-pump cost optimization");
                println!("Version: {}", version::VERSION);
                println!();
                println!("Usage: heatopt [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help    Print this help message");
                println!("  -v, --version Print version");
                return Ok(());
            }
            "--version" | "-v" => {
                println!("{}", version::VERSION);
                return Ok(());
            }
            _ => {}
        }
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    runtime.block_on(async { tokio::task::spawn_blocking(initialize_and_run).await.expect("init task panicked") })
}

/// Collaborators the scheduler's trigger callback needs on every hourly
/// tick. Grouped into one struct so `scheduler::spawn`'s `Fn(Trigger)`
/// closure only captures a single `Arc`.
struct Collaborators {
    device: Arc<dyn DeviceAdapter>,
    prices: Arc<dyn PriceProvider>,
    weather: Arc<dyn WeatherProvider>,
    timeline: Arc<dyn Timeline>,
    store: Arc<dyn KeyValueStore>,
    runtime_handle: tokio::runtime::Handle,
    health: Arc<Mutex<HealthState>>,
    guard: Arc<Mutex<HourGuard>>,
    cycle: Arc<Mutex<CycleInputs>>,
}

fn initialize_and_run() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = config::AppConfig::load()?;

    info!("starting heatopt");
    info!(
        device_id = config.settings.device_id.as_deref().unwrap_or("<unset>"),
        building_id = config.settings.building_id.as_deref().unwrap_or("<unset>"),
        price_source = ?config.settings.price_source,
        time_zone = config.settings.time_zone_name,
        poll_interval_secs = config.poll_interval_secs,
        "configuration summary"
    );

    let runtime_handle = tokio::runtime::Handle::current();

    let device: Arc<dyn DeviceAdapter> =
        Arc::new(HttpDeviceAdapter::new(config.device_base_url.clone(), config.device_api_key.clone())?);

    let prices: Arc<dyn PriceProvider> = match &config.settings.price_source {
        PriceSource::Retail => Arc::new(RetailPriceProvider::new(
            config.price_base_url.clone(),
            config.settings.retail_token.clone().unwrap_or_default(),
        )?),
        PriceSource::Wholesale => Arc::new(WholesaleDayAheadPriceProvider::new(
            config.price_base_url.clone(),
            config.settings.wholesale_area.clone().unwrap_or_default(),
            config.settings.wholesale_token.clone().unwrap_or_default(),
            0,
            config.settings.enable_consumer_markup,
        )?),
    };

    let weather: Arc<dyn WeatherProvider> = Arc::new(HttpWeatherProvider::new(config.weather_base_url.clone())?);

    let store: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(config.storage_dir.clone()));

    let timeline: Arc<dyn Timeline> = match &config.timeline_webhook_url {
        Some(url) => Arc::new(HttpTimeline::new(url.clone())?),
        None => Arc::new(TracingTimeline::new()),
    };

    if runtime_handle.block_on(storage::migrate_legacy_key(store.as_ref()))? {
        info!("migrated legacy optimizer state blob to the optimization-history key");
    }

    let adaptive = runtime_handle
        .block_on(load_or_default::<AdaptiveParameters>(store.as_ref(), storage::KEY_ADAPTIVE_PARAMETERS))?;
    let thermal = runtime_handle
        .block_on(load_or_default::<ThermalCharacteristics>(store.as_ref(), storage::KEY_THERMAL_CHARACTERISTICS))?;
    let hot_water_pattern = runtime_handle
        .block_on(load_or_default::<HotWaterPattern>(store.as_ref(), storage::KEY_HOT_WATER_PATTERN))?;

    let now = Utc::now();
    let comfort_band = config.settings.comfort_band_occupied();
    let zone1_constraints = config.settings.zone1_constraints(comfort_band);
    let zone2_constraints = if config.settings.enable_zone2 {
        Some(ZoneConstraints {
            min_c: config.settings.zone2_lower_occupied.unwrap_or(comfort_band.lower_c),
            max_c: config.settings.zone2_upper_occupied.unwrap_or(comfort_band.upper_c),
            step_c: config.settings.zone2_step.unwrap_or(config.settings.temp_step),
            deadband_c: config.settings.deadband_c,
            min_change_minutes: config.settings.min_change_minutes,
        })
    } else {
        None
    };
    let tank_constraints = if config.settings.enable_tank_control {
        Some(ZoneConstraints {
            min_c: config.settings.tank_lower_c.unwrap_or(40.0),
            max_c: config.settings.tank_upper_c.unwrap_or(55.0),
            step_c: config.settings.tank_step.unwrap_or(1.0),
            deadband_c: 1.0,
            min_change_minutes: config.settings.min_change_minutes,
        })
    } else {
        None
    };

    let cycle = CycleInputs {
        device_id: config.settings.device_id.clone().unwrap_or_default(),
        building_id: config.settings.building_id.clone().unwrap_or_default(),
        currency: config.settings.currency_code.clone(),
        comfort_band,
        zone1: ZoneRuntime { current_setpoint_c: comfort_band.baseline_c(), last_change_time: now, constraints: zone1_constraints },
        zone2: zone2_constraints.map(|c| ZoneRuntime { current_setpoint_c: c.min_c, last_change_time: now, constraints: c }),
        tank: tank_constraints.map(|c| ZoneRuntime { current_setpoint_c: c.min_c, last_change_time: now, constraints: c }),
        p_cheap: config.settings.preheat_cheap_percentile,
        cheap_tier_multiplier: 1.0,
        cop_weight: config.settings.cop_weight,
        space_k_loss: heatopt_core::savings::DEFAULT_SPACE_K_LOSS,
        tank_k_loss: heatopt_core::savings::DEFAULT_TANK_K_LOSS,
        hot_water_pattern,
        adaptive,
        thermal,
        cop_rings: heatopt_core::cop_aggregator::CopRings::default(),
        thermal_samples: Vec::new(),
    };

    // Seed optimistically so the first tick is allowed to actually reach
    // the device and price adapters instead of being gated shut by an
    // empty health history.
    let health = Arc::new(Mutex::new(HealthState {
        last_price_fetch: Some(now),
        last_device_success: Some(now),
        api_errors_last_30_min: 0,
        settings_valid: true,
    }));

    let collaborators = Arc::new(Collaborators {
        device,
        prices,
        weather,
        timeline,
        store,
        runtime_handle: runtime_handle.clone(),
        health,
        guard: Arc::new(Mutex::new(HourGuard::default())),
        cycle: Arc::new(Mutex::new(cycle)),
    });

    let tz = heatopt_core::time::parse_timezone(&config.settings.time_zone_name)
        .unwrap_or(chrono_tz::UTC);

    let scheduler_collaborators = collaborators.clone();
    let _stop_handle = scheduler::spawn(tz, move |trigger| on_trigger(trigger, &scheduler_collaborators));

    info!("entering run loop");
    let mut app = App::new();
    app.add_plugins((TaskPoolPlugin::default(), ScheduleRunnerPlugin::run_loop(Duration::from_millis(250)), HeatOptCorePlugin));
    app.run();

    Ok(())
}

fn on_trigger(trigger: Trigger, collaborators: &Arc<Collaborators>) {
    let collaborators = collaborators.clone();
    match trigger {
        Trigger::Hourly => {
            collaborators.runtime_handle.spawn(async move {
                if let Err(e) = run_one_hour(&collaborators).await {
                    warn!(?e, "hourly cycle skipped");
                }
            });
        }
        Trigger::Weekly => {
            collaborators.runtime_handle.spawn(async move {
                run_weekly(&collaborators).await;
            });
        }
        Trigger::CopDaily | Trigger::CopWeekly | Trigger::CopMonthly => {
            collaborators.runtime_handle.spawn(async move {
                run_cop_boundary(trigger, &collaborators).await;
            });
        }
    }
}

/// Reads daily energy totals from the device and pushes a COP snapshot
/// into the ring matching the boundary that fired (spec §4.5, §4.11).
async fn run_cop_boundary(trigger: Trigger, collaborators: &Collaborators) {
    let now = Utc::now();
    let (device_id, building_id) = {
        let cycle = collaborators.cycle.lock();
        (cycle.device_id.clone(), cycle.building_id.clone())
    };

    let totals = match collaborators.device.energy_totals_daily(&device_id, &building_id).await {
        Ok(totals) => totals,
        Err(e) => {
            warn!(%e, ?trigger, "failed to read daily energy totals at cop boundary");
            return;
        }
    };

    let heat = heatopt_types::cop::EnergyTotals {
        produced_kwh: totals.heat_produced_kwh,
        consumed_kwh: totals.heat_consumed_kwh,
    };
    let water = heatopt_types::cop::EnergyTotals {
        produced_kwh: totals.dhw_produced_kwh,
        consumed_kwh: totals.dhw_consumed_kwh,
    };
    let snapshot = heatopt_core::cop_aggregator::snapshot(now, heat, water);

    let mut cycle = collaborators.cycle.lock();
    match trigger {
        Trigger::CopDaily => heatopt_core::cop_aggregator::push_daily(&mut cycle.cop_rings, snapshot),
        Trigger::CopWeekly => heatopt_core::cop_aggregator::push_weekly(&mut cycle.cop_rings, snapshot),
        Trigger::CopMonthly => heatopt_core::cop_aggregator::push_monthly(&mut cycle.cop_rings, snapshot),
        Trigger::Hourly | Trigger::Weekly => {}
    }
    drop(cycle);

    info!(?trigger, heat_cop = heat.cop(), water_cop = water.cop(), "cop boundary reached");
}

async fn run_one_hour(collaborators: &Collaborators) -> Result<(), heatopt_core::orchestrator::SkipReason> {
    let now = Utc::now();
    let hour_key = {
        use chrono::{Datelike, Timelike};
        (now.year(), now.month(), now.day(), now.hour())
    };

    let health = collaborators.health.lock().clone();
    let mut guard = collaborators.guard.lock();
    let mut cycle = collaborators.cycle.lock();

    let result = run_hourly_cycle(
        collaborators.device.as_ref(),
        collaborators.prices.as_ref(),
        collaborators.weather.as_ref(),
        collaborators.timeline.as_ref(),
        &health,
        &mut guard,
        hour_key,
        now,
        &mut cycle,
    )
    .await;

    {
        let mut health = collaborators.health.lock();
        match &result {
            Ok(_) => {
                health.last_price_fetch = Some(now);
                health.last_device_success = Some(now);
                health.api_errors_last_30_min = 0;
            }
            Err(heatopt_core::orchestrator::SkipReason::DeviceUnreachable) => {
                health.api_errors_last_30_min = health.api_errors_last_30_min.saturating_add(1);
            }
            Err(_) => {}
        }
    }

    let outcome = result?;

    if let Some(outcome) = outcome {
        let store = collaborators.store.clone();
        let adaptive_serialized = serde_json::to_vec(&cycle.adaptive).unwrap_or_default();
        drop(cycle);
        drop(guard);
        if let Err(e) = store.set(storage::KEY_ADAPTIVE_PARAMETERS, adaptive_serialized).await {
            error!(%e, "failed to persist adaptive parameters after a cycle");
        }
        if let Err(e) = append_to_history(store.as_ref(), outcome.clone()).await {
            error!(%e, "failed to append outcome to optimization history");
        }
        info!(savings_minor = outcome.savings_minor, "hourly cycle complete");
    }

    Ok(())
}

/// Appends one completed cycle's outcome to the size- and count-capped
/// optimization-history ring (spec §3, §4.11 step 8).
async fn append_to_history(
    store: &dyn KeyValueStore,
    outcome: heatopt_types::outcome::OptimizationOutcome,
) -> Result<(), heatopt_types::error::CoreError> {
    let existing = store.get(storage::KEY_OPTIMIZATION_HISTORY).await?;
    let updated = storage::append_capped(
        existing.as_deref(),
        outcome,
        storage::MAX_OPTIMIZATION_HISTORY_ENTRIES,
        storage::MAX_OPTIMIZATION_HISTORY_BYTES,
    )?;
    store.set(storage::KEY_OPTIMIZATION_HISTORY, updated).await
}

async fn run_weekly(collaborators: &Collaborators) {
    let now = Utc::now();
    let mut cycle = collaborators.cycle.lock();
    let aggregates = heatopt_core::orchestrator::build_hour_aggregates(&cycle.thermal_samples, now);
    let updated = run_weekly_cycle(&cycle.thermal, &aggregates, now);
    cycle.thermal = updated;
    let serialized = serde_json::to_vec(&cycle.thermal).unwrap_or_default();
    drop(cycle);
    if let Err(e) = collaborators.store.set(storage::KEY_THERMAL_CHARACTERISTICS, serialized).await {
        error!(%e, "failed to persist recalibrated thermal characteristics");
    }
}

async fn load_or_default<T>(store: &dyn KeyValueStore, key: &str) -> Result<T>
where
    T: Default + serde::de::DeserializeOwned,
{
    match store.get(key).await? {
        Some(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_default()),
        None => Ok(T::default()),
    }
}
