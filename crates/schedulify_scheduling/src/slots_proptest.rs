#[cfg(test)]
mod tests {
    use crate::intervals::merge_periods;
    use crate::slots::{suggest_slots, DayHours, SlotRules};
    use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
    use proptest::prelude::*;
    use schedulify_common::services::BusyPeriod;

    const ZONE: &str = "Europe/Zurich";

    // Monday 2025-06-16 00:00 UTC; the generated week stays inside CEST.
    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 16, 0, 0, 0).unwrap()
    }

    fn busy_strategy() -> impl Strategy<Value = Vec<BusyPeriod>> {
        prop::collection::vec((0i64..7 * 24 * 60, 0i64..480), 0..12).prop_map(|raw| {
            raw.into_iter()
                .map(|(offset, len)| {
                    let start = base() + Duration::minutes(offset);
                    (start, start + Duration::minutes(len))
                })
                .collect()
        })
    }

    /// Independent line sweep over the union of the input periods.
    fn covered_minutes(periods: &[BusyPeriod]) -> i64 {
        let mut sorted: Vec<BusyPeriod> = periods
            .iter()
            .copied()
            .filter(|(start, end)| start <= end)
            .collect();
        sorted.sort();
        let mut total = 0i64;
        let mut reach: Option<DateTime<Utc>> = None;
        for (start, end) in sorted {
            match reach {
                Some(r) if start <= r => {
                    if end > r {
                        total += (end - r).num_minutes();
                        reach = Some(end);
                    }
                }
                _ => {
                    total += (end - start).num_minutes();
                    reach = Some(end);
                }
            }
        }
        total
    }

    fn overlaps(a: &BusyPeriod, b: &BusyPeriod) -> bool {
        a.0 < b.1 && a.1 > b.0
    }

    proptest! {
        #[test]
        fn normalizer_output_is_sorted_and_disjoint(
            busy in busy_strategy(),
            tolerance_minutes in 0i64..30,
        ) {
            let merged = merge_periods(&busy, Duration::minutes(tolerance_minutes));
            for pair in merged.windows(2) {
                // sorted, and separated by more than the tolerance
                prop_assert!(pair[0].1 + Duration::minutes(tolerance_minutes) < pair[1].0);
            }
            for (start, end) in &merged {
                prop_assert!(start <= end);
            }
        }

        #[test]
        fn zero_tolerance_preserves_coverage(busy in busy_strategy()) {
            let merged = merge_periods(&busy, Duration::zero());
            let merged_total: i64 = merged
                .iter()
                .map(|(start, end)| (*end - *start).num_minutes())
                .sum();
            prop_assert_eq!(merged_total, covered_minutes(&busy));
        }

        #[test]
        fn slot_walk_invariants(
            busy in busy_strategy(),
            duration_minutes in 15i64..120,
            notice_minutes in 0i64..240,
        ) {
            let rules = SlotRules {
                duration: Duration::minutes(duration_minutes),
                increment: Duration::minutes(30),
                minimum_notice: Duration::minutes(notice_minutes),
                merge_tolerance: Duration::minutes(5),
                hours: DayHours::parse("09:00", "17:00", "12:00", "13:00").unwrap(),
                max_slots: 24,
            };
            let now = base();
            let window_end = base() + Duration::days(7);
            let slots = suggest_slots(&busy, base(), window_end, now, &rules, ZONE).unwrap();

            let tz: chrono_tz::Tz = ZONE.parse().unwrap();
            let break_start = (12, 0);
            for slot in &slots {
                // exact requested duration
                prop_assert_eq!(slot.end - slot.start, Duration::minutes(duration_minutes));
                // notice floor
                prop_assert!(slot.start >= now + Duration::minutes(notice_minutes));
                // never on a weekend in the org zone
                let local_day = slot.start.with_timezone(&tz);
                prop_assert!(!matches!(local_day.weekday(), Weekday::Sat | Weekday::Sun));
                // never overlapping provider busy time
                for period in &busy {
                    prop_assert!(!overlaps(&(slot.start, slot.end), period));
                }
                // never overlapping the break window of its own day
                let day = local_day.date_naive();
                let b_start = crate::timezone::resolve_in(day, break_start.0, break_start.1, tz).unwrap();
                let b_end = crate::timezone::resolve_in(day, 13, 0, tz).unwrap();
                prop_assert!(!overlaps(&(slot.start, slot.end), &(b_start, b_end)));
            }
            // chronological output
            for pair in slots.windows(2) {
                prop_assert!(pair[0].start < pair[1].start);
            }
            prop_assert!(slots.len() <= rules.max_slots);
        }
    }
}
