// File: services/schedulify_backend/src/recorder.rs
//! Downstream recorders wired into the confirmation transaction.

use schedulify_common::services::{BoxFuture, ConfirmedBooking, DownstreamRecorder, RecorderError};
use tracing::info;

/// Writes a structured audit line for every confirmed booking. The
/// practice-management recorder plugs in beside this one; each recorder's
/// failure is an isolated warning on the response.
pub struct AuditLogRecorder;

impl DownstreamRecorder for AuditLogRecorder {
    fn name(&self) -> &str {
        "audit-log"
    }

    fn record(&self, booking: &ConfirmedBooking) -> BoxFuture<'_, (), RecorderError> {
        let booking = booking.clone();
        Box::pin(async move {
            info!(
                meeting_id = %booking.meeting_id,
                start = %booking.start_time,
                end = %booking.end_time,
                participants = booking.participant_refs.len(),
                "booking confirmed"
            );
            Ok(())
        })
    }
}
