// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! C1 — Time & Timezone.
//!
//! All price-window filtering, cron firing, and daily/weekly/monthly
//! snapshot boundaries go through here; nothing else in this crate does
//! raw millisecond arithmetic for day boundaries.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use heatopt_types::error::CoreError;

/// A local wall-clock instant paired with the zone that produced it.
#[derive(Debug, Clone, Copy)]
pub struct ZonedDateTime {
    pub utc: DateTime<Utc>,
    pub tz: Tz,
}

impl ZonedDateTime {
    pub fn local(&self) -> chrono::DateTime<Tz> {
        self.utc.with_timezone(&self.tz)
    }

    pub fn hour_key(&self) -> (i32, u32, u32, u32) {
        let local = self.local();
        (local.year(), local.month(), local.day(), local.hour())
    }
}

/// Parses an IANA timezone name, e.g. `Europe/Berlin`. Fails with
/// `InvalidTimezone` on an unknown name so the orchestrator can fall back
/// to a configured default and log a warning (spec §4.1).
pub fn parse_timezone(name: &str) -> Result<Tz, CoreError> {
    name.parse::<Tz>()
        .map_err(|_| CoreError::InvalidTimezone(name.to_string()))
}

pub fn now_local(tz: Tz) -> ZonedDateTime {
    ZonedDateTime {
        utc: Utc::now(),
        tz,
    }
}

pub fn parse_to_local(instant: DateTime<Utc>, tz: Tz) -> ZonedDateTime {
    ZonedDateTime { utc: instant, tz }
}

/// `[now, now + n hours)` as an absolute UTC range. DST transitions never
/// change the number of wall-clock hours represented here — this is a
/// pure instant window, not a local-day window (see
/// [`local_day_bounds`] for the DST-aware day boundary used by §4.3's
/// percentile window and the daily/weekly/monthly snapshot triggers).
pub fn window_hours_ahead(now: DateTime<Utc>, n: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    (now, now + Duration::hours(n))
}

/// The `[start, end)` UTC instants bounding "today" in `tz`. On a
/// spring-forward day this span is 23 hours; on a fall-back day it is 25
/// hours — callers must never assume 24 (spec §4.1, §8 property 6).
pub fn local_day_bounds(instant: DateTime<Utc>, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_date = instant.with_timezone(&tz).date_naive();
    let start = tz
        .from_local_datetime(&local_date.and_hms_opt(0, 0, 0).expect("valid midnight"))
        .single()
        .unwrap_or_else(|| tz.from_utc_datetime(&local_date.and_hms_opt(0, 0, 0).unwrap()));
    let next_date = local_date + Duration::days(1);
    let end = tz
        .from_local_datetime(&next_date.and_hms_opt(0, 0, 0).expect("valid midnight"))
        .single()
        .unwrap_or_else(|| tz.from_utc_datetime(&next_date.and_hms_opt(0, 0, 0).unwrap()));
    (start.with_timezone(&Utc), end.with_timezone(&Utc))
}

/// Length in hours of the local day containing `instant`: 24 on an
/// ordinary day, 23 on spring-forward, 25 on fall-back.
pub fn local_day_length_hours(instant: DateTime<Utc>, tz: Tz) -> i64 {
    let (start, end) = local_day_bounds(instant, tz);
    (end - start).num_hours()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    #[test]
    fn unknown_timezone_is_rejected() {
        assert!(parse_timezone("Not/A_Zone").is_err());
    }

    #[test]
    fn known_timezone_parses() {
        assert!(parse_timezone("Europe/Berlin").is_ok());
    }

    #[test]
    fn spring_forward_day_is_23_hours() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        // 2026-03-29 is Berlin's spring-forward Sunday.
        let instant = Utc.with_ymd_and_hms(2026, 3, 29, 12, 0, 0).unwrap();
        assert_eq!(local_day_length_hours(instant, tz), 23);
    }

    #[test]
    fn fall_back_day_is_25_hours() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        // 2026-10-25 is Berlin's fall-back Sunday.
        let instant = Utc.with_ymd_and_hms(2026, 10, 25, 12, 0, 0).unwrap();
        assert_eq!(local_day_length_hours(instant, tz), 25);
    }

    #[test]
    fn ordinary_day_is_24_hours() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let instant = Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(local_day_length_hours(instant, tz), 24);
    }

    #[test]
    fn hour_key_identifies_the_same_local_hour() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let a = parse_to_local(Utc.with_ymd_and_hms(2026, 6, 15, 12, 3, 0).unwrap(), tz);
        let b = parse_to_local(Utc.with_ymd_and_hms(2026, 6, 15, 12, 58, 0).unwrap(), tz);
        assert_eq!(a.hour_key(), b.hour_key());
    }
}
