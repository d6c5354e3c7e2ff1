// --- File: crates/schedulify_common/src/services.rs ---
//! Service abstractions for external collaborators.
//!
//! This module defines the traits the booking engine consumes: calendar
//! provider adapters, the credential store that owns token refresh, and the
//! downstream recorders notified after a booking commits. Keeping them as
//! trait objects decouples the engine from concrete vendor clients and makes
//! the retry/refresh logic testable with fakes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Type alias for a boxed future that returns a Result.
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A provider-reported interval during which a calendar resource is
/// unavailable. Always absolute UTC instants with `start <= end`.
pub type BusyPeriod = (DateTime<Utc>, DateTime<Utc>);

/// The external calendar vendor a connection belongs to.
///
/// The stored tag on a [`CalendarAccount`] selects the concrete
/// [`CalendarProvider`] implementation at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    Microsoft,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Microsoft => "microsoft",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(ProviderKind::Google),
            "microsoft" => Ok(ProviderKind::Microsoft),
            other => Err(format!("unknown calendar provider tag: {other}")),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A participant's (or room's) stored calendar connection, as the adapters
/// see it. The persistence layer maps its connection rows into this shape;
/// adapters never reach into storage directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarAccount {
    /// Reference to the participant or room that owns the connection.
    pub owner_ref: String,
    /// Which vendor this connection talks to.
    pub provider: ProviderKind,
    /// The current access token.
    pub access_token: String,
    /// Refresh token, when the grant included one.
    pub refresh_token: Option<String>,
    /// When the access token expires, if known.
    pub token_expires_at: Option<DateTime<Utc>>,
    /// Calendars to include in free/busy checks. Never empty; defaults to
    /// the provider's primary calendar at connection time.
    pub calendar_ids: Vec<String>,
}

/// Errors a credential store may surface.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("no refresh token stored for {0}")]
    NotRefreshable(String),
    #[error("token refresh rejected: {0}")]
    Rejected(String),
    #[error("credential storage error: {0}")]
    Storage(String),
}

/// Errors an adapter may surface across its boundary.
///
/// Every transport-level failure is converted into one of these variants
/// before it leaves the adapter; callers upstream (aggregator, lifecycle)
/// never see a raw HTTP error.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The token was expired and a refresh-then-retry did not recover it.
    #[error("authorization expired for {owner}")]
    AuthorizationExpired { owner: String },
    #[error("provider request timed out: {0}")]
    Timeout(String),
    #[error("provider transport error: {0}")]
    Transport(String),
    #[error("provider API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
    #[error("credential store error: {0}")]
    Credential(#[from] CredentialError),
}

/// A failure reported by a downstream recorder. Expected and routine; these
/// become `warnings` on an otherwise successful booking, never errors.
#[derive(Error, Debug)]
#[error("{recorder}: {message}")]
pub struct RecorderError {
    pub recorder: String,
    pub message: String,
}

/// A trait for calendar provider adapters.
///
/// One implementation per vendor. `fetch_busy` returns the busy intervals
/// for all of the account's selected calendars over the window, already
/// filtered per the vendor's inclusion rules (tentative counts as busy,
/// explicit free / cancelled / all-day events are excluded where the vendor
/// reports them).
pub trait CalendarProvider: Send + Sync {
    fn fetch_busy(
        &self,
        account: &CalendarAccount,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BusyPeriod>, ProviderError>;
}

/// A trait for the credential store that owns provider tokens.
///
/// `refresh` must persist the new token before returning so a concurrent
/// caller picks it up immediately; a refresh race is last-writer-wins (both
/// tokens are valid, one is simply discarded).
pub trait CredentialStore: Send + Sync {
    /// The access token to use for the account right now.
    fn access_token(&self, account: &CalendarAccount) -> BoxFuture<'_, String, CredentialError>;

    /// Exchange the refresh token for a new access token, persist it, and
    /// return it.
    fn refresh(&self, account: &CalendarAccount) -> BoxFuture<'_, String, CredentialError>;
}

/// Details of a confirmed booking handed to downstream recorders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedBooking {
    pub token: String,
    pub meeting_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub participant_refs: Vec<String>,
    pub room_ref: Option<String>,
}

/// A trait for systems notified after a booking is durably confirmed.
///
/// Recorders run strictly after the exclusive write commits. A recorder
/// failure is collected as a warning on the response and never rolls the
/// booking back.
pub trait DownstreamRecorder: Send + Sync {
    /// Short name used in log lines and warning messages.
    fn name(&self) -> &str;

    fn record(&self, booking: &ConfirmedBooking) -> BoxFuture<'_, (), RecorderError>;
}

/// A registry resolving the adapter for a stored provider tag.
pub trait ProviderRegistry: Send + Sync {
    fn provider(&self, kind: ProviderKind) -> Option<Arc<dyn CalendarProvider>>;
}
