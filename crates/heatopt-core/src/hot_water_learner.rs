// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! C7 — Hot-Water Demand Learner.
//!
//! Five-minute tank/energy samples, deduplicated by consumption delta,
//! condensed to hour buckets past 7 days, capped at ~500 KB combined
//! footprint (spec §4.7).

use chrono::{DateTime, Datelike, Timelike, Utc};
use heatopt_types::hotwater::{HotWaterPattern, MIN_SAMPLES_FOR_PROFILE};
use serde::{Deserialize, Serialize};

pub const RAW_RETENTION_DAYS: i64 = 7;
pub const FOOTPRINT_BUDGET_BYTES: usize = 500 * 1024;
const BYTES_PER_RAW_SAMPLE: usize = 32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: DateTime<Utc>,
    pub cumulative_consumption_kwh: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HourBucket {
    pub hour: u32,
    pub day_of_week: u32,
    pub demand_kwh: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotWaterLearnerState {
    pub raw: Vec<RawSample>,
    pub buckets: Vec<HourBucket>,
}

impl HotWaterLearnerState {
    /// Ingests one 5-minute reading. Samples whose consumption delta from
    /// the previous raw sample is (near) zero are dropped — they carry
    /// no new demand information.
    pub fn ingest(&mut self, sample: RawSample) {
        if let Some(last) = self.raw.last() {
            let delta = sample.cumulative_consumption_kwh - last.cumulative_consumption_kwh;
            if delta.abs() < 1e-6 {
                return;
            }
        }
        self.raw.push(sample);
    }

    /// Condenses raw samples older than [`RAW_RETENTION_DAYS`] into hour
    /// buckets and sheds them from the raw list.
    pub fn condense(&mut self, now: DateTime<Utc>) {
        let cutoff = now - chrono::Duration::days(RAW_RETENTION_DAYS);
        let mut keep = Vec::new();
        let mut prior: Option<RawSample> = None;
        for sample in std::mem::take(&mut self.raw) {
            if sample.timestamp >= cutoff {
                keep.push(sample);
                continue;
            }
            if let Some(prev) = prior {
                let demand = (sample.cumulative_consumption_kwh - prev.cumulative_consumption_kwh)
                    .max(0.0);
                self.buckets.push(HourBucket {
                    hour: sample.timestamp.hour(),
                    day_of_week: sample.timestamp.weekday().num_days_from_monday(),
                    demand_kwh: demand,
                });
            }
            prior = Some(sample);
        }
        self.raw = keep;
    }

    pub fn footprint_bytes(&self) -> usize {
        self.raw.len() * BYTES_PER_RAW_SAMPLE + self.buckets.len() * BYTES_PER_RAW_SAMPLE
    }

    /// Sheds the oldest buckets until the footprint clears budget.
    pub fn enforce_footprint_budget(&mut self) {
        while self.footprint_bytes() > FOOTPRINT_BUDGET_BYTES && !self.buckets.is_empty() {
            self.buckets.remove(0);
        }
    }

    pub fn sample_count(&self) -> usize {
        self.raw.len() + self.buckets.len()
    }

    /// Produces the normalized 24x7 profile (spec §4.7). Requires at
    /// least [`MIN_SAMPLES_FOR_PROFILE`] retained samples.
    pub fn to_pattern(&self) -> HotWaterPattern {
        let mut hourly = [0.0_f64; 24];
        let mut by_dow = [[0.0_f64; 24]; 7];
        let mut hourly_counts = [0u32; 24];
        let mut dow_counts = [[0u32; 24]; 7];

        for bucket in &self.buckets {
            let h = bucket.hour as usize;
            hourly[h] += bucket.demand_kwh;
            hourly_counts[h] += 1;
            let d = bucket.day_of_week as usize;
            by_dow[d][h] += bucket.demand_kwh;
            dow_counts[d][h] += 1;
        }

        for h in 0..24 {
            if hourly_counts[h] > 0 {
                hourly[h] /= hourly_counts[h] as f64;
            }
        }
        for d in 0..7 {
            for h in 0..24 {
                if dow_counts[d][h] > 0 {
                    by_dow[d][h] /= dow_counts[d][h] as f64;
                }
            }
        }

        let peak = hourly.iter().copied().fold(0.0_f64, f64::max);
        if peak > 0.0 {
            for v in &mut hourly {
                *v /= peak;
            }
            for row in &mut by_dow {
                for v in row {
                    *v /= peak;
                }
            }
        }

        let count = self.sample_count();
        let confidence = if count < MIN_SAMPLES_FOR_PROFILE {
            0.0
        } else {
            ((count as f64 - MIN_SAMPLES_FOR_PROFILE as f64) / 500.0 * 100.0).clamp(10.0, 100.0)
        };

        HotWaterPattern {
            hourly_demand: hourly,
            by_day_of_week: by_dow,
            sample_count: count,
            confidence,
        }
    }
}
