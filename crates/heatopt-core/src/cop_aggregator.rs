// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! C5 — COP Aggregator.
//!
//! Daily/weekly/monthly coefficient-of-performance snapshots, each kept
//! in a ring capped at 31 entries (spec §4.5).

use chrono::{DateTime, Datelike, Utc};
use heatopt_types::cop::{CopSnapshot, EnergyTotals};
use ringbuffer::{AllocRingBuffer, RingBuffer};

pub const RING_CAPACITY: usize = 31;

pub struct CopRings {
    pub daily: AllocRingBuffer<CopSnapshot>,
    pub weekly: AllocRingBuffer<CopSnapshot>,
    pub monthly: AllocRingBuffer<CopSnapshot>,
}

impl Default for CopRings {
    fn default() -> Self {
        Self {
            daily: AllocRingBuffer::new(RING_CAPACITY),
            weekly: AllocRingBuffer::new(RING_CAPACITY),
            monthly: AllocRingBuffer::new(RING_CAPACITY),
        }
    }
}

pub fn snapshot(timestamp: DateTime<Utc>, heat: EnergyTotals, water: EnergyTotals) -> CopSnapshot {
    CopSnapshot {
        timestamp,
        heat,
        water,
    }
}

pub fn push_daily(rings: &mut CopRings, snapshot: CopSnapshot) {
    rings.daily.push(snapshot);
}

pub fn push_weekly(rings: &mut CopRings, snapshot: CopSnapshot) {
    rings.weekly.push(snapshot);
}

pub fn push_monthly(rings: &mut CopRings, snapshot: CopSnapshot) {
    rings.monthly.push(snapshot);
}

/// Daily boundary: local midnight + 5 minutes.
pub fn is_daily_boundary(local_hour: u32, local_minute: u32) -> bool {
    local_hour == 0 && local_minute == 5
}

/// Weekly boundary: Monday 00:10 local.
pub fn is_weekly_boundary(weekday: chrono::Weekday, local_hour: u32, local_minute: u32) -> bool {
    weekday == chrono::Weekday::Mon && local_hour == 0 && local_minute == 10
}

/// Monthly boundary: 1st of the month, 00:15 local.
pub fn is_monthly_boundary(day: u32, local_hour: u32, local_minute: u32) -> bool {
    day == 1 && local_hour == 0 && local_minute == 15
}

/// Which COP (heating or DHW) is "current" for a given month, per the
/// user-overridable seasonal default: heating Oct-Apr, DHW May-Sep.
pub fn seasonal_current_cop(rings: &CopRings, now: DateTime<Utc>) -> Option<f64> {
    let month = now.month();
    let latest = rings.daily.back()?;
    let heating_season = matches!(month, 10..=12 | 1..=4);
    Some(if heating_season {
        latest.heat.cop()
    } else {
        latest.water.cop()
    })
}
