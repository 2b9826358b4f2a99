// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! C12 — Scheduler.
//!
//! Cron-like triggers evaluated once a minute against the user's IANA
//! timezone (spec §4.12): hourly at minute 0, the weekly procedure Sunday
//! 02:00 local, and the daily/weekly/monthly COP boundaries from
//! [`crate::cop_aggregator`]. Missed wall-clock minutes (the process was
//! asleep, or a tick took too long) are never coalesced into a burst of
//! catch-up runs — each tick only fires what matches the minute it woke
//! up on.

use chrono::{Datelike, Timelike};
use chrono_tz::Tz;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cop_aggregator::{is_daily_boundary, is_monthly_boundary, is_weekly_boundary};
use crate::time::now_local;

const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Hourly,
    Weekly,
    CopDaily,
    CopWeekly,
    CopMonthly,
}

/// Which triggers fire for the local wall-clock minute `now` falls on.
/// Pure so it can be unit-tested without a running clock.
pub fn triggers_for(now: chrono::DateTime<Tz>) -> Vec<Trigger> {
    let mut fired = Vec::new();
    if now.minute() == 0 {
        fired.push(Trigger::Hourly);
    }
    if now.weekday() == chrono::Weekday::Sun && now.hour() == 2 && now.minute() == 0 {
        fired.push(Trigger::Weekly);
    }
    if is_daily_boundary(now.hour(), now.minute()) {
        fired.push(Trigger::CopDaily);
    }
    if is_weekly_boundary(now.weekday(), now.hour(), now.minute()) {
        fired.push(Trigger::CopWeekly);
    }
    if is_monthly_boundary(now.day(), now.hour(), now.minute()) {
        fired.push(Trigger::CopMonthly);
    }
    fired
}

/// A cooperative stop flag shared between the scheduler loop and whoever
/// owns its lifecycle (the orchestrator, on a settings timezone change).
#[derive(Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Spawns the minute-resolution scheduler loop against `tz`. The caller
/// owns the returned [`StopHandle`]; on a timezone change the whole loop
/// is stopped and a fresh one spawned rather than re-parented onto the
/// new zone in place (spec §4.12 — stop-and-recreate, not mutate-in-place).
pub fn spawn<F>(tz: Tz, on_trigger: F) -> StopHandle
where
    F: Fn(Trigger) + Send + Sync + 'static,
{
    let stop = StopHandle::new();
    let loop_stop = stop.clone();
    tokio::spawn(async move {
        info!(timezone = %tz, "scheduler loop starting");
        loop {
            if loop_stop.is_stopped() {
                info!("scheduler loop stopping");
                break;
            }
            let now = now_local(tz).local();
            for trigger in triggers_for(now) {
                on_trigger(trigger);
            }
            tokio::time::sleep(TICK_INTERVAL).await;
        }
    });
    stop
}

/// Reparses the configured timezone name, warning and falling back to
/// the previous zone on an unknown name rather than panicking the
/// scheduler (spec §4.1).
pub fn resolve_timezone_or_warn(name: &str, fallback: Tz) -> Tz {
    match crate::time::parse_timezone(name) {
        Ok(tz) => tz,
        Err(err) => {
            warn!(timezone = name, %err, "unknown timezone in settings, keeping previous zone");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(tz: Tz, y: i32, m: u32, d: u32, h: u32, min: u32) -> chrono::DateTime<Tz> {
        tz.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn hourly_fires_only_at_minute_zero() {
        let tz: Tz = "Europe/Prague".parse().unwrap();
        assert!(triggers_for(at(tz, 2026, 6, 1, 13, 0)).contains(&Trigger::Hourly));
        assert!(!triggers_for(at(tz, 2026, 6, 1, 13, 1)).contains(&Trigger::Hourly));
    }

    #[test]
    fn weekly_fires_sunday_2am_local_only() {
        // 2026-06-07 is a Sunday.
        let tz: Tz = "Europe/Prague".parse().unwrap();
        assert!(triggers_for(at(tz, 2026, 6, 7, 2, 0)).contains(&Trigger::Weekly));
        assert!(!triggers_for(at(tz, 2026, 6, 7, 3, 0)).contains(&Trigger::Weekly));
        assert!(!triggers_for(at(tz, 2026, 6, 8, 2, 0)).contains(&Trigger::Weekly));
    }

    #[test]
    fn cop_boundaries_match_aggregator_helpers() {
        let tz: Tz = "Europe/Prague".parse().unwrap();
        assert!(triggers_for(at(tz, 2026, 6, 1, 0, 5)).contains(&Trigger::CopDaily));
        assert!(triggers_for(at(tz, 2026, 6, 1, 0, 15)).contains(&Trigger::CopMonthly));
    }

    #[test]
    fn missed_minutes_are_not_coalesced() {
        // A single call to triggers_for only ever reflects the one minute
        // passed in; there is no backlog parameter to replay skipped ticks.
        let tz: Tz = "Europe/Prague".parse().unwrap();
        let fired = triggers_for(at(tz, 2026, 6, 1, 13, 0));
        assert_eq!(fired, vec![Trigger::Hourly]);
    }

    #[test]
    fn stop_handle_reflects_stop_call() {
        let handle = StopHandle::new();
        assert!(!handle.is_stopped());
        handle.stop();
        assert!(handle.is_stopped());
    }

    #[test]
    fn unknown_timezone_falls_back_with_warning() {
        let fallback: Tz = "Europe/Prague".parse().unwrap();
        let resolved = resolve_timezone_or_warn("Not/A_Zone", fallback);
        assert_eq!(resolved, fallback);
    }
}
