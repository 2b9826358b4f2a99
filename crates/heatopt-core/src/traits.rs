// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! External collaborator traits (spec §6). Concrete implementations live
//! in `heatopt-adapters`; this crate only depends on the trait objects so
//! the orchestrator can swap a provider on a settings change without a
//! recompile of the decision logic.

use async_trait::async_trait;
use heatopt_types::device::DeviceSnapshot;
use heatopt_types::error::CoreError;
use heatopt_types::price::PricePoint;

#[derive(Debug, Clone)]
pub struct DeviceHandle {
    pub id: String,
    pub name: String,
    pub building_id: String,
}

#[derive(Debug, Clone, Copy)]
pub struct DailyEnergyTotals {
    pub heat_produced_kwh: f64,
    pub heat_consumed_kwh: f64,
    pub dhw_produced_kwh: f64,
    pub dhw_consumed_kwh: f64,
    pub cop_heat: Option<f64>,
    pub cop_dhw: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceZone {
    Zone1,
    Zone2,
    Tank,
}

/// Device vendor API client (spec §6). Errors are the adapter's own
/// taxonomy (`AuthRequired`, `RateLimited`, `Transient`, `InvalidDevice`,
/// `Offline`); implementations convert them into [`CoreError`] before
/// returning here so the orchestrator only ever sees the shared taxonomy.
#[async_trait]
pub trait DeviceAdapter: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<DeviceHandle>, CoreError>;
    async fn snapshot(&self, id: &str, building_id: &str) -> Result<DeviceSnapshot, CoreError>;
    async fn set_setpoint(
        &self,
        id: &str,
        building_id: &str,
        zone: DeviceZone,
        target_c: f64,
    ) -> Result<(), CoreError>;
    async fn energy_totals_daily(
        &self,
        id: &str,
        building_id: &str,
    ) -> Result<DailyEnergyTotals, CoreError>;
}

#[derive(Debug, Clone)]
pub struct PriceQuote {
    pub current: PricePoint,
    pub series: Vec<PricePoint>,
    pub currency: String,
}

/// Price back-end (spec §6, §9). Modeled as a trait with two concrete
/// implementations in `heatopt-adapters` (retail, day-ahead wholesale
/// with markup + FX) rather than an enum dispatch inside this crate, so
/// the orchestrator holds a single `Box<dyn PriceProvider>` and swaps it
/// wholesale on a settings change.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn get_prices(&self, currency: &str) -> Result<PriceQuote, CoreError>;
}

#[derive(Debug, Clone, Copy)]
pub struct WeatherHourly {
    pub hours_ahead: i64,
    pub temperature_c: f64,
    pub wind_mps: f64,
    pub cloud_pct: f64,
}

#[derive(Debug, Clone)]
pub struct WeatherForecast {
    pub current_temperature_c: f64,
    pub hourly: Vec<WeatherHourly>,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn forecast(&self, lat: f64, lon: f64) -> Result<WeatherForecast, CoreError>;
}

/// Best-effort user-facing notification sink (spec §6). If unavailable,
/// callers fall back to `notify(excerpt)`.
#[async_trait]
pub trait Timeline: Send + Sync {
    async fn emit(&self, title: &str, body: &str, icon: Option<&str>);
    async fn notify(&self, excerpt: &str);
}
