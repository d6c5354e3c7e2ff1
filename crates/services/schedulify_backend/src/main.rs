// File: services/schedulify_backend/src/main.rs
use axum::{extract::State, routing::get, Json, Router};
use schedulify_booking::logic::BookingService;
use schedulify_booking::routes as booking_routes;
use schedulify_common::services::{CredentialStore, DownstreamRecorder};
use schedulify_config::load_config;
use schedulify_db::repositories::{
    BookingRepository, CalendarConnectionRepository, SqlBookingRepository,
    SqlCalendarConnectionRepository,
};
use schedulify_db::DbClient;
use schedulify_providers::CalendarProviders;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

mod credential_store;
mod recorder;

use credential_store::StoredCredentialStore;
use recorder::AuditLogRecorder;

#[axum::debug_handler]
async fn health_handler(State(db): State<DbClient>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "database": if db.is_healthy().await { "ok" } else { "unavailable" },
    }))
}

#[tokio::main]
async fn main() {
    schedulify_common::logging::init();
    let config = Arc::new(load_config().expect("Failed to load config"));

    // 1. Storage
    let db_url = config
        .database
        .as_ref()
        .map(|db| db.url.clone())
        .unwrap_or_else(|| {
            info!("no database configured, using local sqlite file");
            "sqlite://schedulify.db".to_string()
        });
    let db_client = DbClient::from_url(&db_url)
        .await
        .expect("Failed to connect to database");

    let booking_repo = SqlBookingRepository::new(db_client.clone());
    booking_repo
        .init_schema()
        .await
        .expect("Failed to initialize booking schema");
    let connection_repo = SqlCalendarConnectionRepository::new(db_client.clone());
    connection_repo
        .init_schema()
        .await
        .expect("Failed to initialize calendar connection schema");

    // 2. External collaborators
    let credentials: Arc<dyn CredentialStore> = Arc::new(StoredCredentialStore::new(
        SqlCalendarConnectionRepository::new(db_client.clone()),
    ));
    let registry = Arc::new(CalendarProviders::new(credentials, &config.providers));
    let recorders: Vec<Arc<dyn DownstreamRecorder>> = vec![Arc::new(AuditLogRecorder)];

    // 3. The booking engine behind the public link surface
    let service = Arc::new(BookingService::new(
        booking_repo,
        connection_repo,
        registry,
        recorders,
        config.scheduling.clone(),
    ));

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to Schedulify API!" }))
        .route("/health", get(health_handler))
        .with_state(db_client.clone());

    let app = Router::new()
        .nest("/api", api_router)
        .nest("/r", booking_routes::routes(service))
        .layer(TraceLayer::new_for_http());

    // 4. Bind and serve
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await.unwrap();
    println!("Starting server at http://{}", addr);
    println!("Booking links served at http://{}/r/<token>", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}
