// --- File: crates/schedulify_scheduling/src/lib.rs ---
// Declare modules within this crate
pub mod busy;
pub mod intervals;
pub mod slots;
#[cfg(test)]
mod slots_proptest;
pub mod timezone;

pub use busy::{collect_busy, AggregatedBusy, BusySource};
pub use intervals::merge_periods;
pub use slots::{suggest_slots, DayHours, SlotRules, TimeSlot};
pub use timezone::{resolve_local, TimezoneError};
