// --- File: crates/schedulify_db/src/lib.rs ---
//! Persistence for Schedulify.
//!
//! A database-agnostic client over SQLx (`Any` driver; SQLite by default,
//! PostgreSQL and MySQL behind features) plus the repositories for booking
//! requests, meetings, and calendar connections. The booking repository is
//! where confirmation exclusivity lives: one conditional UPDATE keyed by
//! token and expected prior status, so it holds across any number of
//! concurrently running handler instances.

pub mod client;
pub mod error;
pub mod repositories;

pub use client::DbClient;
pub use error::DbError;
pub use repositories::{
    BookingRepository, BookingRequest, CalendarConnection, CalendarConnectionRepository,
    LocationMode, Meeting, MeetingStatus, RequestStatus, SqlBookingRepository,
    SqlCalendarConnectionRepository,
};
