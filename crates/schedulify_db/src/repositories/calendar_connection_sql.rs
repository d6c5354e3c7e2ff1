// --- File: crates/schedulify_db/src/repositories/calendar_connection_sql.rs ---
//! SQL implementation of the calendar connection repository.

use crate::error::DbError;
use crate::repositories::calendar_connection::{CalendarConnection, CalendarConnectionRepository};
use crate::DbClient;
use chrono::{DateTime, SecondsFormat, Utc};
use schedulify_common::services::ProviderKind;
use sqlx::Row;
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct SqlCalendarConnectionRepository {
    db_client: DbClient,
}

impl SqlCalendarConnectionRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn fmt_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn connection_from_row(row: &sqlx::any::AnyRow) -> Result<CalendarConnection, DbError> {
    let provider: String = row
        .try_get("provider")
        .map_err(|e| DbError::QueryError(e.to_string()))?;
    let calendar_ids: String = row
        .try_get("selected_calendar_ids")
        .map_err(|e| DbError::QueryError(e.to_string()))?;
    let token_expires_at: Option<String> = row.try_get("token_expires_at").ok().flatten();
    Ok(CalendarConnection {
        id: row.try_get("id").ok(),
        owner_ref: row.try_get("owner_ref").unwrap_or_default(),
        provider: provider
            .parse::<ProviderKind>()
            .map_err(DbError::CorruptValue)?,
        access_token: row.try_get("access_token").unwrap_or_default(),
        refresh_token: row.try_get("refresh_token").ok().flatten(),
        token_expires_at: token_expires_at
            .as_deref()
            .map(|v| {
                DateTime::parse_from_rfc3339(v)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| DbError::CorruptValue(format!("token_expires_at {v:?}: {e}")))
            })
            .transpose()?,
        selected_calendar_ids: serde_json::from_str(&calendar_ids)
            .map_err(|e| DbError::CorruptValue(format!("selected_calendar_ids: {e}")))?,
    })
}

impl CalendarConnectionRepository for SqlCalendarConnectionRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing calendar connection schema");

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS calendar_connections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_ref TEXT NOT NULL,
                provider TEXT NOT NULL,
                access_token TEXT NOT NULL,
                refresh_token TEXT,
                token_expires_at TEXT,
                selected_calendar_ids TEXT NOT NULL,
                UNIQUE(owner_ref, provider)
            )
        "#,
            )
            .await?;

        Ok(())
    }

    async fn upsert_connection(
        &self,
        connection: CalendarConnection,
    ) -> Result<CalendarConnection, DbError> {
        debug!(
            "Upserting {} connection for {}",
            connection.provider, connection.owner_ref
        );

        let calendar_ids = serde_json::to_string(&connection.selected_calendar_ids)
            .map_err(|e| DbError::CorruptValue(format!("selected_calendar_ids: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO calendar_connections
                (owner_ref, provider, access_token, refresh_token, token_expires_at, selected_calendar_ids)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT(owner_ref, provider) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                token_expires_at = excluded.token_expires_at,
                selected_calendar_ids = excluded.selected_calendar_ids
        "#,
        )
        .bind(&connection.owner_ref)
        .bind(connection.provider.as_str())
        .bind(&connection.access_token)
        .bind(&connection.refresh_token)
        .bind(connection.token_expires_at.map(fmt_instant))
        .bind(&calendar_ids)
        .execute(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to upsert calendar connection: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        Ok(connection)
    }

    async fn find_by_owner(&self, owner_ref: &str) -> Result<Option<CalendarConnection>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_ref, provider, access_token, refresh_token,
                   token_expires_at, selected_calendar_ids
            FROM calendar_connections
            WHERE owner_ref = $1
        "#,
        )
        .bind(owner_ref)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to find calendar connection: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        row.as_ref().map(connection_from_row).transpose()
    }

    async fn update_access_token(
        &self,
        owner_ref: &str,
        provider: ProviderKind,
        access_token: &str,
        token_expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), DbError> {
        // Plain last-writer-wins: a concurrent refresh just overwrites with
        // another valid token.
        sqlx::query(
            r#"
            UPDATE calendar_connections
            SET access_token = $1, token_expires_at = $2
            WHERE owner_ref = $3 AND provider = $4
        "#,
        )
        .bind(access_token)
        .bind(token_expires_at.map(fmt_instant))
        .bind(owner_ref)
        .bind(provider.as_str())
        .execute(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to update access token: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        Ok(())
    }
}
