// --- File: crates/schedulify_booking/src/logic.rs ---
//! Booking-link lifecycle and the confirmation transaction.
//!
//! Every public operation re-validates the link's state on entry: expiry is
//! evaluated lazily on access, so no background sweep exists. The only
//! mutual exclusion in the system is the repository's conditional update;
//! this module turns its outcome into the user-facing result.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use schedulify_common::error::SchedulifyError;
use schedulify_common::services::{ConfirmedBooking, DownstreamRecorder, ProviderRegistry};
use schedulify_config::SchedulingConfig;
use schedulify_db::repositories::{
    BookingRepository, BookingRequest, CalendarConnectionRepository, Meeting, RequestStatus,
};
use schedulify_db::DbError;
use schedulify_scheduling::slots::{suggest_slots, DayHours, SlotError, SlotRules};
use schedulify_scheduling::{collect_busy, BusySource};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

// --- Error Handling ---
use thiserror::Error;
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Link not found")]
    NotFound,
    #[error("This link has expired")]
    Expired,
    #[error("This link is no longer open")]
    AlreadyBooked,
    #[error("This link has been cancelled")]
    Cancelled,
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Slot computation failed: {0}")]
    Slot(#[from] SlotError),
    #[error("Storage error: {0}")]
    Db(#[from] DbError),
}

/// Collapse into the shared taxonomy at the HTTP boundary: the shared
/// variants carry the user-visible copy and status mapping; anything
/// infrastructural becomes `Internal` with its detail kept server-side.
impl From<BookingError> for SchedulifyError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound => SchedulifyError::NotFound,
            BookingError::Expired => SchedulifyError::Expired,
            BookingError::AlreadyBooked => SchedulifyError::AlreadyBooked,
            BookingError::Cancelled => SchedulifyError::Cancelled,
            BookingError::Validation(message) => SchedulifyError::Validation(message),
            BookingError::Slot(err) => SchedulifyError::Internal(err.to_string()),
            BookingError::Db(err) => SchedulifyError::Internal(err.to_string()),
        }
    }
}

// --- Data Structures ---
#[derive(Deserialize, Debug)]
pub struct SlotsQuery {
    /// IANA zone the slot labels are rendered in; defaults to the org zone.
    pub timezone: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SlotView {
    pub start: String, // ISO 8601 format
    pub end: String,   // ISO 8601 format
    pub label: String,
}

#[derive(Serialize, Debug)]
pub struct SlotsResponse {
    pub slots: Vec<SlotView>,
}

#[derive(Deserialize, Debug)]
pub struct ConfirmRequest {
    pub start_time: String, // ISO 8601 format string
    pub end_time: String,   // ISO 8601 format string
}

#[derive(Serialize, Debug)]
pub struct ConfirmResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// The booking engine: lifecycle guard, slot computation, confirmation.
///
/// Stateless per request; every instance only holds its collaborators, so
/// any number of copies can serve traffic concurrently.
pub struct BookingService<B, C> {
    requests: B,
    connections: C,
    registry: Arc<dyn ProviderRegistry>,
    recorders: Vec<Arc<dyn DownstreamRecorder>>,
    scheduling: SchedulingConfig,
}

impl<B, C> BookingService<B, C>
where
    B: BookingRepository,
    C: CalendarConnectionRepository,
{
    pub fn new(
        requests: B,
        connections: C,
        registry: Arc<dyn ProviderRegistry>,
        recorders: Vec<Arc<dyn DownstreamRecorder>>,
        scheduling: SchedulingConfig,
    ) -> Self {
        Self {
            requests,
            connections,
            registry,
            recorders,
            scheduling,
        }
    }

    /// Issues a fresh shareable link for a meeting.
    ///
    /// The token is the sole credential for the public surface, so it is a
    /// full random UUID: unguessable and unique.
    pub async fn issue_link(
        &self,
        mut meeting: Meeting,
        now: DateTime<Utc>,
    ) -> Result<BookingRequest, BookingError> {
        if meeting.id.is_empty() {
            meeting.id = Uuid::new_v4().simple().to_string();
        }
        if meeting.participant_refs.is_empty() {
            return Err(BookingError::Validation(
                "a meeting needs at least one participant".to_string(),
            ));
        }
        let meeting = self.requests.create_meeting(meeting).await?;

        let request = BookingRequest {
            token: Uuid::new_v4().simple().to_string(),
            meeting_id: meeting.id.clone(),
            status: RequestStatus::Open,
            expires_at: now + Duration::days(self.scheduling.link_ttl_days),
            created_at: None,
            updated_at: None,
        };
        let request = self.requests.create_request(request).await?;
        info!("issued booking link for meeting {}", request.meeting_id);
        Ok(request)
    }

    /// The lifecycle guard every read path goes through: only an `Open`,
    /// unexpired request offers slots or accepts a confirmation. Expiry is
    /// recorded lazily the first time someone touches a stale link.
    async fn load_open_request(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(BookingRequest, Meeting), BookingError> {
        let request = self
            .requests
            .find_request(token)
            .await?
            .ok_or(BookingError::NotFound)?;

        match request.status {
            RequestStatus::Open if now < request.expires_at => {}
            RequestStatus::Open => {
                self.requests.mark_expired(token).await?;
                return Err(BookingError::Expired);
            }
            RequestStatus::Completed => return Err(BookingError::AlreadyBooked),
            RequestStatus::Expired => return Err(BookingError::Expired),
            RequestStatus::Cancelled => return Err(BookingError::Cancelled),
        }

        let meeting = self
            .requests
            .find_meeting(&request.meeting_id)
            .await?
            .ok_or(BookingError::NotFound)?;
        Ok((request, meeting))
    }

    /// Computes the candidate slots for a link.
    ///
    /// Only derived free slots and display labels leave this function; busy
    /// intervals and participant identities never reach the response.
    pub async fn fetch_slots(
        &self,
        token: &str,
        client_timezone: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotView>, BookingError> {
        let (_, meeting) = self.load_open_request(token, now).await?;

        let label_zone = match client_timezone {
            Some(zone) => Tz::from_str(zone)
                .map_err(|_| BookingError::Validation(format!("unknown timezone: {zone}")))?,
            None => Tz::from_str(&self.scheduling.time_zone)
                .map_err(|_| BookingError::Validation("org timezone misconfigured".to_string()))?,
        };

        // Every required resource is one busy source; a room is just one
        // more owner to check.
        let mut owners: Vec<String> = meeting.participant_refs.clone();
        if let Some(room) = &meeting.room_ref {
            owners.push(room.clone());
        }
        let mut sources = Vec::with_capacity(owners.len());
        for owner in owners {
            let account = self
                .connections
                .find_by_owner(&owner)
                .await?
                .map(|connection| connection.to_account());
            sources.push(BusySource {
                owner_ref: owner,
                account,
            });
        }

        let window_start = now;
        let window_end = now + Duration::days(self.scheduling.search_window_days);
        let tolerance = Duration::minutes(self.scheduling.merge_tolerance_minutes);
        let busy = collect_busy(
            self.registry.as_ref(),
            &sources,
            window_start,
            window_end,
            tolerance,
        )
        .await;

        let rules = SlotRules {
            duration: Duration::minutes(meeting.duration_minutes),
            increment: Duration::minutes(self.scheduling.slot_increment_minutes),
            minimum_notice: Duration::minutes(self.scheduling.minimum_notice_minutes),
            merge_tolerance: tolerance,
            hours: DayHours::parse(
                &self.scheduling.business_hours_start,
                &self.scheduling.business_hours_end,
                &self.scheduling.break_start,
                &self.scheduling.break_end,
            )?,
            max_slots: self.scheduling.max_slots,
        };
        let slots = suggest_slots(
            &busy.periods,
            window_start,
            window_end,
            now,
            &rules,
            &self.scheduling.time_zone,
        )?;

        if slots.is_empty() && busy.checks_degraded {
            // Diagnostic only: the caller still sees "no availability", but
            // operators can tell this apart from a genuinely full calendar.
            warn!(
                "no slots for {}: every calendar check failed, availability unknown",
                token
            );
        }

        Ok(slots
            .into_iter()
            .map(|slot| SlotView {
                start: slot.start.to_rfc3339(),
                end: slot.end.to_rfc3339(),
                label: slot_label(slot.start, slot.end, label_zone),
            })
            .collect())
    }

    /// The confirmation transaction.
    ///
    /// Re-validates, then funnels through the repository's conditional
    /// update: exactly one of two racing confirmations observes itself as
    /// the transitioning writer. Recorders run only after that write
    /// commits, and their failures come back as warnings on a successful
    /// response; the participant has a real time held by then and must
    /// never be told the booking failed.
    pub async fn confirm(
        &self,
        token: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, BookingError> {
        let (_, meeting) = self.load_open_request(token, now).await?;

        if end_time <= start_time {
            return Err(BookingError::Validation(
                "end_time must be after start_time".to_string(),
            ));
        }
        if end_time - start_time != Duration::minutes(meeting.duration_minutes) {
            return Err(BookingError::Validation(format!(
                "slot must be exactly {} minutes",
                meeting.duration_minutes
            )));
        }

        let won = self
            .requests
            .complete_open_request(token, start_time, end_time, now)
            .await?;
        if !won {
            // Lost the race between our validation read and the write;
            // re-read to surface the terminal state the winner left behind.
            return Err(self.losing_confirm_error(token, now).await?);
        }

        let booking = ConfirmedBooking {
            token: token.to_string(),
            meeting_id: meeting.id.clone(),
            start_time,
            end_time,
            participant_refs: meeting.participant_refs.clone(),
            room_ref: meeting.room_ref.clone(),
        };
        let mut warnings = Vec::new();
        for recorder in &self.recorders {
            if let Err(err) = recorder.record(&booking).await {
                warn!("downstream recorder failed after booking: {}", err);
                warnings.push(err.to_string());
            }
        }
        info!("confirmed booking for meeting {}", meeting.id);
        Ok(warnings)
    }

    async fn losing_confirm_error(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<BookingError, BookingError> {
        let request = self.requests.find_request(token).await?;
        Ok(match request.map(|r| (r.status, r.expires_at)) {
            None => BookingError::NotFound,
            Some((RequestStatus::Completed, _)) => BookingError::AlreadyBooked,
            Some((RequestStatus::Cancelled, _)) => BookingError::Cancelled,
            Some((RequestStatus::Expired, _)) => BookingError::Expired,
            Some((RequestStatus::Open, expires_at)) if now >= expires_at => BookingError::Expired,
            // Still open and unexpired yet the conditional write missed:
            // treat as a conflict, same copy as already-booked.
            Some((RequestStatus::Open, _)) => BookingError::AlreadyBooked,
        })
    }

    /// The deliberate `Completed -> Open` transition: releases the held slot
    /// and re-opens the link with a fresh deadline.
    pub async fn reschedule(&self, token: &str, now: DateTime<Utc>) -> Result<(), BookingError> {
        let new_deadline = now + Duration::days(self.scheduling.link_ttl_days);
        if self.requests.reopen_request(token, new_deadline).await? {
            info!("reopened booking link for reschedule");
            return Ok(());
        }

        let request = self
            .requests
            .find_request(token)
            .await?
            .ok_or(BookingError::NotFound)?;
        Err(match request.status {
            RequestStatus::Open => {
                BookingError::Validation("nothing to reschedule: link is still open".to_string())
            }
            RequestStatus::Expired => BookingError::Expired,
            RequestStatus::Cancelled => BookingError::Cancelled,
            // reopen_request only misses a completed row under a race
            RequestStatus::Completed => BookingError::AlreadyBooked,
        })
    }

    /// Terminal cancellation; also cancels the meeting.
    pub async fn cancel(&self, token: &str) -> Result<(), BookingError> {
        if self.requests.cancel_request(token).await? {
            info!("cancelled booking link");
            return Ok(());
        }

        let request = self
            .requests
            .find_request(token)
            .await?
            .ok_or(BookingError::NotFound)?;
        Err(match request.status {
            RequestStatus::Expired => BookingError::Expired,
            _ => BookingError::Cancelled,
        })
    }
}

fn slot_label(start: DateTime<Utc>, end: DateTime<Utc>, zone: Tz) -> String {
    let local_start = start.with_timezone(&zone);
    let local_end = end.with_timezone(&zone);
    format!(
        "{} to {}",
        local_start.format("%a, %d %b %Y %H:%M"),
        local_end.format("%H:%M")
    )
}
