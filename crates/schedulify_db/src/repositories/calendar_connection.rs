// --- File: crates/schedulify_db/src/repositories/calendar_connection.rs ---
//! Stored calendar connections for participants and rooms.

use crate::error::DbError;
use chrono::{DateTime, Utc};
use schedulify_common::services::{CalendarAccount, ProviderKind};
use serde::{Deserialize, Serialize};

/// One participant's (or room's) connection to one provider, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConnection {
    pub id: Option<i64>,
    pub owner_ref: String,
    pub provider: ProviderKind,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    /// Never empty; set to the provider's primary calendar when the owner
    /// connected without picking any.
    pub selected_calendar_ids: Vec<String>,
}

impl CalendarConnection {
    /// The shape the provider adapters consume.
    pub fn to_account(&self) -> CalendarAccount {
        CalendarAccount {
            owner_ref: self.owner_ref.clone(),
            provider: self.provider,
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            token_expires_at: self.token_expires_at,
            calendar_ids: self.selected_calendar_ids.clone(),
        }
    }
}

/// Repository for calendar connections.
///
/// Token updates are last-writer-wins by design: a refresh race leaves one
/// of two valid tokens in place, which is acceptable.
pub trait CalendarConnectionRepository: Send + Sync {
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Insert or replace the connection for `(owner_ref, provider)`.
    fn upsert_connection(
        &self,
        connection: CalendarConnection,
    ) -> impl std::future::Future<Output = Result<CalendarConnection, DbError>> + Send;

    /// The connection for an owner, if any.
    fn find_by_owner(
        &self,
        owner_ref: &str,
    ) -> impl std::future::Future<Output = Result<Option<CalendarConnection>, DbError>> + Send;

    /// Persist a freshly refreshed access token.
    fn update_access_token(
        &self,
        owner_ref: &str,
        provider: ProviderKind,
        access_token: &str,
        token_expires_at: Option<DateTime<Utc>>,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;
}
