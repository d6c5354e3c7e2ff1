// --- File: crates/schedulify_booking/src/routes.rs ---

use crate::handlers::{cancel_handler, confirm_handler, fetch_slots_handler, reschedule_handler};
use crate::logic::BookingService;
use axum::{
    routing::{get, post},
    Router,
};
use schedulify_db::repositories::{BookingRepository, CalendarConnectionRepository};
use std::sync::Arc;

/// Creates the public link router, mounted under `/r` so a shared link is
/// `<base>/r/<token>`. The token in the path is the sole credential.
pub fn routes<B, C>(service: Arc<BookingService<B, C>>) -> Router
where
    B: BookingRepository + 'static,
    C: CalendarConnectionRepository + 'static,
{
    Router::new()
        .route("/{token}/slots", get(fetch_slots_handler::<B, C>))
        .route("/{token}/confirm", post(confirm_handler::<B, C>))
        .route("/{token}/reschedule", post(reschedule_handler::<B, C>))
        .route("/{token}/cancel", post(cancel_handler::<B, C>))
        .with_state(service)
}
