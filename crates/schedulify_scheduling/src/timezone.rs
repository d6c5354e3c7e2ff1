// --- File: crates/schedulify_scheduling/src/timezone.rs ---
//! Wall-clock to instant resolution.
//!
//! Business hours are configured as wall-clock times in the organization's
//! zone; everything downstream works in absolute UTC instants. The
//! conversion here is deliberately offset-agnostic: it formats a trial
//! instant into the target zone and corrects by the observed wall-clock
//! delta, so it stays correct across daylight-saving transitions without the
//! callers knowing anything about zone rules. Swapping in a direct
//! tz-database lookup later only touches this module.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum TimezoneError {
    #[error("unrecognized timezone: {0}")]
    UnknownZone(String),
    #[error("invalid wall-clock time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
}

/// Resolves the instant at which a named zone's wall clock shows
/// `date hour:minute`.
///
/// An unrecognized zone name is an input error, never silently defaulted.
pub fn resolve_local(
    date: NaiveDate,
    hour: u32,
    minute: u32,
    zone: &str,
) -> Result<DateTime<Utc>, TimezoneError> {
    let tz = Tz::from_str(zone).map_err(|_| TimezoneError::UnknownZone(zone.to_string()))?;
    resolve_in(date, hour, minute, tz)
}

/// Same as [`resolve_local`] for an already-parsed zone.
pub fn resolve_in(
    date: NaiveDate,
    hour: u32,
    minute: u32,
    tz: Tz,
) -> Result<DateTime<Utc>, TimezoneError> {
    let naive = date
        .and_hms_opt(hour, minute, 0)
        .ok_or(TimezoneError::InvalidTime { hour, minute })?;

    // Trial instant carrying the desired wall clock as if the zone were UTC.
    let trial = Utc.from_utc_datetime(&naive);
    let observed = trial.with_timezone(&tz);

    // Wall-clock delta between desired and observed; a date shift folds into
    // the hour delta. Real zone offsets move by a few hours at most, so one
    // correction pass lands on the right instant even on transition days.
    let day_delta = observed
        .date_naive()
        .signed_duration_since(date)
        .num_days();
    let hour_delta = i64::from(hour) - (i64::from(observed.hour()) + day_delta * 24);
    let minute_delta = i64::from(minute) - i64::from(observed.minute());

    Ok(trial + Duration::hours(hour_delta) + Duration::minutes(minute_delta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn round_trip(date: NaiveDate, hour: u32, minute: u32, zone: &str) {
        let instant = resolve_local(date, hour, minute, zone).unwrap();
        let tz = Tz::from_str(zone).unwrap();
        let local = instant.with_timezone(&tz);
        assert_eq!(
            (local.date_naive(), local.hour(), local.minute()),
            (date, hour, minute),
            "round trip failed for {date} {hour:02}:{minute:02} in {zone}",
        );
    }

    #[test]
    fn resolves_plain_days() {
        round_trip(NaiveDate::from_ymd_opt(2025, 6, 17).unwrap(), 9, 0, "Europe/Zurich");
        round_trip(NaiveDate::from_ymd_opt(2025, 6, 17).unwrap(), 17, 30, "America/New_York");
        round_trip(NaiveDate::from_ymd_opt(2025, 6, 17).unwrap(), 0, 0, "Pacific/Auckland");
    }

    #[test]
    fn resolves_across_spring_forward() {
        // Europe DST starts 2025-03-30; business hours after the jump.
        let day = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap();
        round_trip(day, 9, 0, "Europe/Zurich");
        round_trip(day, 12, 0, "Europe/Zurich");
        round_trip(day, 17, 0, "Europe/Zurich");
        // US DST starts 2025-03-09.
        let day = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        round_trip(day, 9, 0, "America/New_York");
    }

    #[test]
    fn resolves_across_fall_back() {
        let day = NaiveDate::from_ymd_opt(2025, 10, 26).unwrap();
        round_trip(day, 9, 0, "Europe/Zurich");
        round_trip(day, 17, 0, "Europe/Zurich");
        let day = NaiveDate::from_ymd_opt(2025, 11, 2).unwrap();
        round_trip(day, 13, 0, "America/Chicago");
    }

    #[test]
    fn handles_fractional_offsets() {
        round_trip(NaiveDate::from_ymd_opt(2025, 6, 17).unwrap(), 9, 0, "Asia/Kathmandu");
        round_trip(NaiveDate::from_ymd_opt(2025, 6, 17).unwrap(), 9, 0, "Asia/Kolkata");
    }

    #[test]
    fn spring_forward_shifts_the_utc_anchor() {
        // 09:00 Zurich is 08:00 UTC under CET but 07:00 UTC under CEST.
        let before = resolve_local(NaiveDate::from_ymd_opt(2025, 3, 29).unwrap(), 9, 0, "Europe/Zurich").unwrap();
        let after = resolve_local(NaiveDate::from_ymd_opt(2025, 3, 30).unwrap(), 9, 0, "Europe/Zurich").unwrap();
        assert_eq!(before.hour(), 8);
        assert_eq!(after.hour(), 7);
        assert_eq!(before.date_naive().day() + 1, after.date_naive().day());
    }

    #[test]
    fn unknown_zone_is_an_error() {
        let err = resolve_local(NaiveDate::from_ymd_opt(2025, 6, 17).unwrap(), 9, 0, "Mars/Olympus");
        assert_eq!(err, Err(TimezoneError::UnknownZone("Mars/Olympus".to_string())));
    }

    #[test]
    fn out_of_range_wall_clock_is_an_error() {
        let err = resolve_local(NaiveDate::from_ymd_opt(2025, 6, 17).unwrap(), 24, 0, "Europe/Zurich");
        assert_eq!(err, Err(TimezoneError::InvalidTime { hour: 24, minute: 0 }));
    }
}
