// --- File: crates/schedulify_scheduling/src/intervals.rs ---
//! Busy-interval normalization.

use chrono::Duration;
use schedulify_common::services::BusyPeriod;

/// Merges an unordered list of busy intervals into a minimal sorted set.
///
/// Two intervals separated by less than `tolerance` are combined, so
/// back-to-back provider events do not leave micro-gaps too short to hold a
/// slot. Intervals with `end < start` are dropped rather than trusted.
pub fn merge_periods(periods: &[BusyPeriod], tolerance: Duration) -> Vec<BusyPeriod> {
    let mut sorted: Vec<BusyPeriod> = periods
        .iter()
        .copied()
        .filter(|(start, end)| start <= end)
        .collect();
    if sorted.is_empty() {
        return Vec::new();
    }
    sorted.sort_by_key(|(start, _)| *start);

    let mut merged = vec![sorted[0]];
    for &(start, end) in &sorted[1..] {
        let last = merged.last_mut().unwrap();
        if start <= last.1 + tolerance {
            last.1 = last.1.max(end);
        } else {
            merged.push((start, end));
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 17, hour, minute, 0).unwrap()
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(merge_periods(&[], Duration::zero()).is_empty());
    }

    #[test]
    fn overlapping_periods_collapse() {
        let merged = merge_periods(
            &[(at(9, 0), at(10, 30)), (at(10, 0), at(11, 0))],
            Duration::zero(),
        );
        assert_eq!(merged, vec![(at(9, 0), at(11, 0))]);
    }

    #[test]
    fn disjoint_periods_stay_separate_and_sorted() {
        let merged = merge_periods(
            &[(at(14, 0), at(15, 0)), (at(9, 0), at(10, 0))],
            Duration::zero(),
        );
        assert_eq!(merged, vec![(at(9, 0), at(10, 0)), (at(14, 0), at(15, 0))]);
    }

    #[test]
    fn near_adjacent_periods_merge_within_tolerance() {
        let merged = merge_periods(
            &[(at(9, 0), at(10, 0)), (at(10, 3), at(11, 0))],
            Duration::minutes(5),
        );
        assert_eq!(merged, vec![(at(9, 0), at(11, 0))]);

        // just past the tolerance they stay apart
        let merged = merge_periods(
            &[(at(9, 0), at(10, 0)), (at(10, 6), at(11, 0))],
            Duration::minutes(5),
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn contained_periods_disappear() {
        let merged = merge_periods(
            &[(at(9, 0), at(12, 0)), (at(10, 0), at(10, 30))],
            Duration::zero(),
        );
        assert_eq!(merged, vec![(at(9, 0), at(12, 0))]);
    }

    #[test]
    fn inverted_periods_are_dropped() {
        let merged = merge_periods(&[(at(11, 0), at(10, 0))], Duration::zero());
        assert!(merged.is_empty());
    }
}
