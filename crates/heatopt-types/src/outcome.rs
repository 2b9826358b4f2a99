// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

use crate::price::PriceTier;
use crate::zone::ZoneId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlannedAction {
    Preheat,
    Coast,
    Maintain,
    Boost,
    DhwNow,
    DhwDelay,
}

/// Before/after setpoint and savings for a single zone within one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneDelta {
    pub zone: ZoneId,
    pub before_c: f64,
    pub after_c: f64,
    pub changed: bool,
    pub savings_minor: i64,
}

/// A single persisted record of one hourly cycle. Appended to a ring
/// capped at 500 entries or 500 KB of serialized settings, whichever hits
/// first (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    pub timestamp: DateTime<Utc>,
    pub price_minor: i64,
    pub price_tier: PriceTier,
    pub zone_deltas: Vec<ZoneDelta>,
    pub action: PlannedAction,
    pub reason_tokens: Vec<String>,
    pub savings_minor: i64,
    pub confidence_snapshot: f64,
}

impl OptimizationOutcome {
    pub fn total_savings_minor(&self) -> i64 {
        self.zone_deltas.iter().map(|d| d.savings_minor).sum()
    }
}
