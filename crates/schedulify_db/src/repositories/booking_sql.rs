// --- File: crates/schedulify_db/src/repositories/booking_sql.rs ---
//! SQL implementation of the booking repository.

use crate::error::DbError;
use crate::repositories::booking::{
    BookingRepository, BookingRequest, LocationMode, Meeting, MeetingStatus, RequestStatus,
};
use crate::DbClient;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;
use tracing::{debug, error};

/// SQL implementation of the booking repository
#[derive(Debug, Clone)]
pub struct SqlBookingRepository {
    db_client: DbClient,
}

impl SqlBookingRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

/// Instants are stored as second-truncated, Z-suffixed RFC3339 TEXT: the
/// `Any` driver does not decode `DateTime<Utc>`, and the fixed-width format
/// makes SQL string comparison agree with time order (the expiry guard in
/// `complete_open_request` relies on that).
fn fmt_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::CorruptValue(format!("timestamp {value:?}: {e}")))
}

fn parse_optional_instant(value: Option<String>) -> Result<Option<DateTime<Utc>>, DbError> {
    value.as_deref().map(parse_instant).transpose()
}

fn request_from_row(row: &sqlx::any::AnyRow) -> Result<BookingRequest, DbError> {
    let status: String = row
        .try_get("status")
        .map_err(|e| DbError::QueryError(e.to_string()))?;
    let expires_at: String = row
        .try_get("expires_at")
        .map_err(|e| DbError::QueryError(e.to_string()))?;
    Ok(BookingRequest {
        token: row.try_get("token").unwrap_or_default(),
        meeting_id: row.try_get("meeting_id").unwrap_or_default(),
        status: status
            .parse::<RequestStatus>()
            .map_err(DbError::CorruptValue)?,
        expires_at: parse_instant(&expires_at)?,
        created_at: parse_optional_instant(row.try_get("created_at").ok().flatten())?,
        updated_at: parse_optional_instant(row.try_get("updated_at").ok().flatten())?,
    })
}

fn meeting_from_row(row: &sqlx::any::AnyRow) -> Result<Meeting, DbError> {
    let location_mode: String = row
        .try_get("location_mode")
        .map_err(|e| DbError::QueryError(e.to_string()))?;
    let status: String = row
        .try_get("status")
        .map_err(|e| DbError::QueryError(e.to_string()))?;
    let participants: String = row
        .try_get("participant_refs")
        .map_err(|e| DbError::QueryError(e.to_string()))?;
    Ok(Meeting {
        id: row.try_get("id").unwrap_or_default(),
        duration_minutes: row.try_get("duration_minutes").unwrap_or_default(),
        location_mode: location_mode
            .parse::<LocationMode>()
            .map_err(DbError::CorruptValue)?,
        participant_refs: serde_json::from_str(&participants)
            .map_err(|e| DbError::CorruptValue(format!("participant_refs: {e}")))?,
        room_ref: row.try_get("room_ref").ok().flatten(),
        start_time: parse_optional_instant(row.try_get("start_time").ok().flatten())?,
        end_time: parse_optional_instant(row.try_get("end_time").ok().flatten())?,
        status: status
            .parse::<MeetingStatus>()
            .map_err(DbError::CorruptValue)?,
    })
}

impl BookingRepository for SqlBookingRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking schema");

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS meetings (
                id TEXT PRIMARY KEY,
                duration_minutes INTEGER NOT NULL,
                location_mode TEXT NOT NULL,
                participant_refs TEXT NOT NULL,
                room_ref TEXT,
                start_time TEXT,
                end_time TEXT,
                status TEXT NOT NULL
            )
        "#,
            )
            .await?;

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS booking_requests (
                token TEXT PRIMARY KEY,
                meeting_id TEXT NOT NULL,
                status TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                created_at TEXT,
                updated_at TEXT
            )
        "#,
            )
            .await?;

        Ok(())
    }

    async fn create_meeting(&self, meeting: Meeting) -> Result<Meeting, DbError> {
        debug!("Creating meeting {}", meeting.id);

        let participants = serde_json::to_string(&meeting.participant_refs)
            .map_err(|e| DbError::CorruptValue(format!("participant_refs: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO meetings (id, duration_minutes, location_mode, participant_refs,
                                  room_ref, start_time, end_time, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
        )
        .bind(&meeting.id)
        .bind(meeting.duration_minutes)
        .bind(meeting.location_mode.as_str())
        .bind(&participants)
        .bind(&meeting.room_ref)
        .bind(meeting.start_time.map(fmt_instant))
        .bind(meeting.end_time.map(fmt_instant))
        .bind(meeting.status.as_str())
        .execute(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to insert meeting: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        Ok(meeting)
    }

    async fn create_request(&self, request: BookingRequest) -> Result<BookingRequest, DbError> {
        debug!("Creating booking request for meeting {}", request.meeting_id);

        let now = fmt_instant(Utc::now());
        sqlx::query(
            r#"
            INSERT INTO booking_requests (token, meeting_id, status, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#,
        )
        .bind(&request.token)
        .bind(&request.meeting_id)
        .bind(request.status.as_str())
        .bind(fmt_instant(request.expires_at))
        .bind(&now)
        .bind(&now)
        .execute(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to insert booking request: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        Ok(request)
    }

    async fn find_request(&self, token: &str) -> Result<Option<BookingRequest>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT token, meeting_id, status, expires_at, created_at, updated_at
            FROM booking_requests
            WHERE token = $1
        "#,
        )
        .bind(token)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to find booking request: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        row.as_ref().map(request_from_row).transpose()
    }

    async fn find_meeting(&self, meeting_id: &str) -> Result<Option<Meeting>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT id, duration_minutes, location_mode, participant_refs,
                   room_ref, start_time, end_time, status
            FROM meetings
            WHERE id = $1
        "#,
        )
        .bind(meeting_id)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to find meeting: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        row.as_ref().map(meeting_from_row).transpose()
    }

    async fn complete_open_request(
        &self,
        token: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let mut tx = self.db_client.begin().await?;

        // The one conditional write that decides a confirmation race: only a
        // still-open, unexpired row transitions, and rows_affected tells the
        // caller whether it was the transitioning writer.
        let result = sqlx::query(
            r#"
            UPDATE booking_requests
            SET status = 'completed', updated_at = $1
            WHERE token = $2 AND status = 'open' AND expires_at > $1
        "#,
        )
        .bind(fmt_instant(now))
        .bind(token)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to complete booking request: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE meetings
            SET start_time = $1, end_time = $2, status = 'booked'
            WHERE id = (SELECT meeting_id FROM booking_requests WHERE token = $3)
        "#,
        )
        .bind(fmt_instant(start_time))
        .bind(fmt_instant(end_time))
        .bind(token)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to write meeting times: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        Ok(true)
    }

    async fn mark_expired(&self, token: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE booking_requests
            SET status = 'expired', updated_at = $1
            WHERE token = $2 AND status = 'open'
        "#,
        )
        .bind(fmt_instant(Utc::now()))
        .bind(token)
        .execute(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to mark booking request expired: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn cancel_request(&self, token: &str) -> Result<bool, DbError> {
        let mut tx = self.db_client.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE booking_requests
            SET status = 'cancelled', updated_at = $1
            WHERE token = $2 AND status IN ('open', 'completed')
        "#,
        )
        .bind(fmt_instant(Utc::now()))
        .bind(token)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to cancel booking request: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE meetings
            SET status = 'cancelled'
            WHERE id = (SELECT meeting_id FROM booking_requests WHERE token = $1)
        "#,
        )
        .bind(token)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to cancel meeting: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        Ok(true)
    }

    async fn reopen_request(
        &self,
        token: &str,
        new_expires_at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let mut tx = self.db_client.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE booking_requests
            SET status = 'open', expires_at = $1, updated_at = $2
            WHERE token = $3 AND status = 'completed'
        "#,
        )
        .bind(fmt_instant(new_expires_at))
        .bind(fmt_instant(Utc::now()))
        .bind(token)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to reopen booking request: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            return Ok(false);
        }

        // Clearing the held times travels with the status flip or not at all.
        sqlx::query(
            r#"
            UPDATE meetings
            SET start_time = NULL, end_time = NULL, status = 'proposed'
            WHERE id = (SELECT meeting_id FROM booking_requests WHERE token = $1)
        "#,
        )
        .bind(token)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to clear meeting times: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        Ok(true)
    }
}
