// --- File: crates/schedulify_scheduling/src/slots.rs ---
//! Candidate slot enumeration.
//!
//! Walks the search window one calendar day at a time in the organization's
//! zone, subtracts busy time plus the daily break, and emits fixed-duration
//! candidate slots on a fixed increment. Output is chronological; callers
//! render it directly, so the ordering is part of the contract.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use chrono_tz::Tz;
use schedulify_common::services::BusyPeriod;
use std::str::FromStr;
use thiserror::Error;

use crate::intervals::merge_periods;
use crate::timezone::{resolve_in, TimezoneError};

#[derive(Error, Debug, PartialEq)]
pub enum SlotError {
    #[error(transparent)]
    Timezone(#[from] TimezoneError),
    #[error("invalid time of day: {0}")]
    InvalidTimeOfDay(String),
}

/// A candidate meeting time, free across every required resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Wall-clock day boundaries, as `(hour, minute)` pairs in the org zone.
#[derive(Debug, Clone, Copy)]
pub struct DayHours {
    pub open: (u32, u32),
    pub close: (u32, u32),
    pub break_start: (u32, u32),
    pub break_end: (u32, u32),
}

impl DayHours {
    /// Parses `"HH:MM"` boundary strings, the format they carry in config.
    pub fn parse(
        open: &str,
        close: &str,
        break_start: &str,
        break_end: &str,
    ) -> Result<Self, SlotError> {
        Ok(Self {
            open: parse_time_of_day(open)?,
            close: parse_time_of_day(close)?,
            break_start: parse_time_of_day(break_start)?,
            break_end: parse_time_of_day(break_end)?,
        })
    }
}

fn parse_time_of_day(value: &str) -> Result<(u32, u32), SlotError> {
    let invalid = || SlotError::InvalidTimeOfDay(value.to_string());
    let (h, m) = value.split_once(':').ok_or_else(invalid)?;
    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

/// Parameters of one slot-generation run.
#[derive(Debug, Clone, Copy)]
pub struct SlotRules {
    pub duration: Duration,
    pub increment: Duration,
    pub minimum_notice: Duration,
    pub merge_tolerance: Duration,
    pub hours: DayHours,
    pub max_slots: usize,
}

/// Enumerates free slots of `rules.duration` between `window_start` and
/// `window_end`, skipping weekends, honoring business hours, the daily
/// break, and the minimum-notice floor. Stops at `rules.max_slots`; the walk
/// is chronological so slots nearer in time always survive the cap.
pub fn suggest_slots(
    busy: &[BusyPeriod],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    now: DateTime<Utc>,
    rules: &SlotRules,
    zone: &str,
) -> Result<Vec<TimeSlot>, SlotError> {
    let tz = Tz::from_str(zone)
        .map_err(|_| SlotError::Timezone(TimezoneError::UnknownZone(zone.to_string())))?;

    let mut slots = Vec::new();
    if rules.duration <= Duration::zero() || window_end <= window_start {
        return Ok(slots);
    }

    let notice_floor = now + rules.minimum_notice;
    let mut day = window_start.with_timezone(&tz).date_naive();
    let last_day = window_end.with_timezone(&tz).date_naive();

    while day <= last_day && slots.len() < rules.max_slots {
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            day = day.succ_opt().unwrap();
            continue;
        }

        let open = resolve_in(day, rules.hours.open.0, rules.hours.open.1, tz)?;
        let close = resolve_in(day, rules.hours.close.0, rules.hours.close.1, tz)?;
        let break_start =
            resolve_in(day, rules.hours.break_start.0, rules.hours.break_start.1, tz)?;
        let break_end = resolve_in(day, rules.hours.break_end.0, rules.hours.break_end.1, tz)?;

        let day_start = open.max(window_start);
        let day_end = close.min(window_end);
        if day_end <= day_start {
            day = day.succ_opt().unwrap();
            continue;
        }

        // The break is just one more busy interval for this day.
        let mut day_busy: Vec<BusyPeriod> = busy
            .iter()
            .filter(|(start, end)| *start < day_end && *end > day_start)
            .copied()
            .collect();
        if break_end > break_start {
            day_busy.push((break_start, break_end));
        }
        let merged = merge_periods(&day_busy, rules.merge_tolerance);

        // Walk the open time left to right, emitting from every gap.
        let mut cursor = day_start;
        for &(busy_start, busy_end) in &merged {
            emit_gap(&mut slots, cursor, busy_start.min(day_end), notice_floor, rules);
            cursor = cursor.max(busy_end);
            if cursor >= day_end || slots.len() >= rules.max_slots {
                break;
            }
        }
        emit_gap(&mut slots, cursor, day_end, notice_floor, rules);

        day = day.succ_opt().unwrap();
    }

    slots.truncate(rules.max_slots);
    Ok(slots)
}

/// Emits every slot start on the increment within `[gap_start, gap_end]`
/// such that the whole slot fits and clears the notice floor.
fn emit_gap(
    slots: &mut Vec<TimeSlot>,
    gap_start: DateTime<Utc>,
    gap_end: DateTime<Utc>,
    notice_floor: DateTime<Utc>,
    rules: &SlotRules,
) {
    let mut start = gap_start;
    while start + rules.duration <= gap_end {
        if slots.len() >= rules.max_slots {
            return;
        }
        if start >= notice_floor {
            slots.push(TimeSlot {
                start,
                end: start + rules.duration,
            });
        }
        start += rules.increment;
    }
}
