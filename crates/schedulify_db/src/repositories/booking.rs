// --- File: crates/schedulify_db/src/repositories/booking.rs ---
//! Booking request and meeting entities, and the repository interface that
//! guards their lifecycle transitions.

use crate::error::DbError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle state of a shareable booking link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Open,
    Completed,
    Expired,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::Completed => "completed",
            RequestStatus::Expired => "expired",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(RequestStatus::Open),
            "completed" => Ok(RequestStatus::Completed),
            "expired" => Ok(RequestStatus::Expired),
            "cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(format!("unknown request status: {other}")),
        }
    }
}

/// Whether the meeting happens remotely or needs a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    Remote,
    InPerson,
}

impl LocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationMode::Remote => "remote",
            LocationMode::InPerson => "inperson",
        }
    }
}

impl FromStr for LocationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remote" => Ok(LocationMode::Remote),
            "inperson" => Ok(LocationMode::InPerson),
            other => Err(format!("unknown location mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Proposed,
    Booked,
    Cancelled,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Proposed => "proposed",
            MeetingStatus::Booked => "booked",
            MeetingStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for MeetingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proposed" => Ok(MeetingStatus::Proposed),
            "booked" => Ok(MeetingStatus::Booked),
            "cancelled" => Ok(MeetingStatus::Cancelled),
            other => Err(format!("unknown meeting status: {other}")),
        }
    }
}

/// The shareable-link entity gating one meeting's confirmation.
///
/// Requests are never deleted, only superseded in status, so the table is
/// its own audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    /// Opaque, unguessable, unique. The sole credential for the public
    /// surface.
    pub token: String,
    pub meeting_id: String,
    pub status: RequestStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The meeting a booking link resolves to. `start_time`/`end_time` stay
/// absent until confirmation and are cleared again only by a reschedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Meeting {
    pub id: String,
    pub duration_minutes: i64,
    pub location_mode: LocationMode,
    /// Ordered, host first.
    pub participant_refs: Vec<String>,
    pub room_ref: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: MeetingStatus,
}

/// Repository for booking requests and their meetings.
///
/// Every state transition here is a conditional update keyed by token and
/// expected prior status; the `bool` results report whether this caller won
/// the transition. That is the entire mutual-exclusion story — there is no
/// in-process locking, so the guarantees hold across concurrently running
/// handler instances.
pub trait BookingRepository: Send + Sync {
    /// Create the tables if they don't exist.
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    fn create_meeting(
        &self,
        meeting: Meeting,
    ) -> impl std::future::Future<Output = Result<Meeting, DbError>> + Send;

    /// Persist a freshly issued request (status `Open`).
    fn create_request(
        &self,
        request: BookingRequest,
    ) -> impl std::future::Future<Output = Result<BookingRequest, DbError>> + Send;

    fn find_request(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Option<BookingRequest>, DbError>> + Send;

    fn find_meeting(
        &self,
        meeting_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Meeting>, DbError>> + Send;

    /// The single point of exclusivity: atomically move an `Open`, unexpired
    /// request to `Completed` and write the meeting's held times. Exactly
    /// one of two racing callers observes `true`; the other gets `false`
    /// and must surface a conflict, never a silent overwrite.
    fn complete_open_request(
        &self,
        token: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;

    /// Lazily record that an `Open` request's deadline has passed.
    fn mark_expired(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;

    /// Terminal cancellation from `Open` or `Completed`; also cancels the
    /// meeting.
    fn cancel_request(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;

    /// The deliberate `Completed -> Open` transition: re-opens the link with
    /// a fresh deadline and clears the meeting's held times atomically.
    fn reopen_request(
        &self,
        token: &str,
        new_expires_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;
}
