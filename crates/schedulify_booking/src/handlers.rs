// --- File: crates/schedulify_booking/src/handlers.rs ---
use crate::logic::{
    BookingError, BookingService, ConfirmRequest, ConfirmResponse, SlotsQuery, SlotsResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use schedulify_common::error::{HttpStatusCode, SchedulifyError};
use schedulify_db::repositories::{BookingRepository, CalendarConnectionRepository};
use std::sync::Arc;
use tracing::info;

/// Maps engine errors onto the user-visible copy for each terminal state.
/// Internal failure details are logged and never leak to the external party.
fn error_response(err: BookingError) -> (StatusCode, String) {
    let shared: SchedulifyError = err.into();
    let status = StatusCode::from_u16(shared.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = match &shared {
        SchedulifyError::Internal(detail) => {
            info!("internal failure on booking surface: {}", detail);
            "Internal error.".to_string()
        }
        other => other.to_string(),
    };
    (status, message)
}

fn parse_instant(value: &str, field: &str) -> Result<DateTime<Utc>, (StatusCode, String)> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                format!("Invalid {field} format (RFC3339)"),
            )
        })
}

/// Handler to get available time slots for a link.
pub async fn fetch_slots_handler<B, C>(
    State(service): State<Arc<BookingService<B, C>>>,
    Path(token): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, (StatusCode, String)>
where
    B: BookingRepository + 'static,
    C: CalendarConnectionRepository + 'static,
{
    let slots = service
        .fetch_slots(&token, query.timezone.as_deref(), Utc::now())
        .await
        .map_err(error_response)?;
    Ok(Json(SlotsResponse { slots }))
}

/// Handler to confirm a slot choice.
pub async fn confirm_handler<B, C>(
    State(service): State<Arc<BookingService<B, C>>>,
    Path(token): Path<String>,
    Json(payload): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, (StatusCode, String)>
where
    B: BookingRepository + 'static,
    C: CalendarConnectionRepository + 'static,
{
    let start_time = parse_instant(&payload.start_time, "start_time")?;
    let end_time = parse_instant(&payload.end_time, "end_time")?;

    let warnings = service
        .confirm(&token, start_time, end_time, Utc::now())
        .await
        .map_err(error_response)?;
    Ok(Json(ConfirmResponse {
        success: true,
        warnings,
    }))
}

/// Handler for the deliberate reschedule transition.
pub async fn reschedule_handler<B, C>(
    State(service): State<Arc<BookingService<B, C>>>,
    Path(token): Path<String>,
) -> Result<Json<ConfirmResponse>, (StatusCode, String)>
where
    B: BookingRepository + 'static,
    C: CalendarConnectionRepository + 'static,
{
    service
        .reschedule(&token, Utc::now())
        .await
        .map_err(error_response)?;
    Ok(Json(ConfirmResponse {
        success: true,
        warnings: Vec::new(),
    }))
}

/// Handler for cancelling a link.
pub async fn cancel_handler<B, C>(
    State(service): State<Arc<BookingService<B, C>>>,
    Path(token): Path<String>,
) -> Result<Json<ConfirmResponse>, (StatusCode, String)>
where
    B: BookingRepository + 'static,
    C: CalendarConnectionRepository + 'static,
{
    service.cancel(&token).await.map_err(error_response)?;
    Ok(Json(ConfirmResponse {
        success: true,
        warnings: Vec::new(),
    }))
}
