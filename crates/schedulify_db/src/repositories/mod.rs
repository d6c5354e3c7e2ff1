// --- File: crates/schedulify_db/src/repositories/mod.rs ---
//! Repository traits and SQL implementations for the booking entities.

pub mod booking;
pub mod booking_sql;
pub mod calendar_connection;
pub mod calendar_connection_sql;

pub use booking::{
    BookingRepository, BookingRequest, LocationMode, Meeting, MeetingStatus, RequestStatus,
};
pub use booking_sql::SqlBookingRepository;
pub use calendar_connection::{CalendarConnection, CalendarConnectionRepository};
pub use calendar_connection_sql::SqlCalendarConnectionRepository;
