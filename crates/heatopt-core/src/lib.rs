// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// heat-pump optimization core: behavior lives here, shape lives in heatopt-types.

pub mod adaptive_parameters;
pub mod config;
pub mod constraint_kernel;
pub mod cop_aggregator;
pub mod decision_engine;
pub mod hot_water_learner;
pub mod orchestrator;
pub mod price_analyzer;
pub mod savings;
pub mod scheduler;
pub mod storage;
pub mod thermal_model;
pub mod time;
pub mod traits;
pub mod weather_bias;

pub use config::{RunConfig, Settings};
pub use orchestrator::{CycleInputs, HealthState, HourGuard, SkipReason, ZoneRuntime};
pub use scheduler::{StopHandle, Trigger};
pub use storage::KeyValueStore;
pub use traits::{DeviceAdapter, PriceProvider, Timeline, WeatherProvider};

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;

/// Thin ECS wrapper around the cooperatively-scheduled scheduler loop's
/// stop handle, so it can be torn down from a system on app shutdown.
#[derive(Resource, Default)]
pub struct SchedulerHandle(pub Option<StopHandle>);

/// Core plugin: registers the bounded-storage migration check and the
/// scheduler handle resource. Mirrors the teacher's core-plugin pattern
/// of a thin `Plugin::build` that wires `Startup` systems and defers the
/// real work to this crate's modules.
pub struct HeatOptCorePlugin;

impl Plugin for HeatOptCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SchedulerHandle>()
            .add_systems(Startup, log_startup_system);
    }
}

fn log_startup_system() {
    tracing::info!("heatopt-core initialized");
}
