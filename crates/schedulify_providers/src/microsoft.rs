// --- File: crates/schedulify_providers/src/microsoft.rs ---
//! Microsoft Graph calendar adapter.
//!
//! Graph's calendarView reports whole events rather than busy windows, so
//! the inclusion rules live here: cancelled events, all-day events, and
//! events marked `free` are excluded; `tentative` counts as busy.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, NaiveDateTime, Utc};
use schedulify_common::http::create_client;
use schedulify_common::services::{
    BoxFuture, BusyPeriod, CalendarAccount, CalendarProvider, CredentialStore, ProviderError,
};
use schedulify_config::ProviderEndpointConfig;
use serde::Deserialize;
use tracing::warn;

use crate::google::map_transport_error;

/// Base URL for Microsoft Graph v1.0.
const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Page size for calendarView requests.
const PAGE_SIZE: usize = 250;

pub struct MicrosoftCalendarProvider {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl MicrosoftCalendarProvider {
    pub fn new(credentials: Arc<dyn CredentialStore>, config: &ProviderEndpointConfig) -> Self {
        let http = create_client(StdDuration::from_secs(config.timeout_secs))
            .expect("Failed to create HTTP client");
        Self {
            http,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| GRAPH_API_BASE.to_string()),
            credentials,
        }
    }

    /// calendarView for one calendar, following `@odata.nextLink` paging.
    async fn query_calendar_view(
        &self,
        token: &str,
        calendar_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BusyPeriod>, ProviderError> {
        // Graph addresses the default calendar without an id segment.
        let base = if calendar_id == "primary" {
            format!("{}/me/calendar/calendarView", self.base_url)
        } else {
            format!(
                "{}/me/calendars/{}/calendarView",
                self.base_url,
                urlencoding::encode(calendar_id)
            )
        };

        let mut periods = Vec::new();
        let mut next_url: Option<String> = None;
        loop {
            let mut request = match &next_url {
                Some(url) => self.http.get(url),
                None => self.http.get(&base).query(&[
                    ("startDateTime", window_start.to_rfc3339()),
                    ("endDateTime", window_end.to_rfc3339()),
                    ("$top", PAGE_SIZE.to_string()),
                ]),
            };
            // Have Graph hand event times back already converted to UTC.
            request = request
                .bearer_auth(token)
                .header("Prefer", "outlook.timezone=\"UTC\"");

            let response = request.send().await.map_err(map_transport_error)?;
            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(ProviderError::AuthorizationExpired {
                    owner: String::new(),
                });
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let body = response
                .text()
                .await
                .map_err(|e| ProviderError::Transport(format!("failed to read response: {e}")))?;
            let page: CalendarViewResponse = serde_json::from_str(&body).map_err(|e| {
                ProviderError::InvalidResponse(format!("calendarView parse failed: {e}"))
            })?;

            periods.extend(busy_from_events(&page.value));
            match page.next_link {
                Some(link) => next_url = Some(link),
                None => break,
            }
        }

        Ok(periods)
    }
}

impl CalendarProvider for MicrosoftCalendarProvider {
    fn fetch_busy(
        &self,
        account: &CalendarAccount,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BusyPeriod>, ProviderError> {
        let account = account.clone();
        Box::pin(async move {
            crate::credentials::fetch_with_refresh(self.credentials.as_ref(), &account, |token| {
                let calendar_ids = account.calendar_ids.clone();
                async move {
                    let mut periods = Vec::new();
                    for calendar_id in &calendar_ids {
                        periods.extend(
                            self.query_calendar_view(&token, calendar_id, window_start, window_end)
                                .await?,
                        );
                    }
                    periods.sort_by_key(|(start, _)| *start);
                    Ok(periods)
                }
            })
            .await
        })
    }
}

/// Applies the Graph inclusion rules and converts the survivors.
fn busy_from_events(events: &[GraphEvent]) -> Vec<BusyPeriod> {
    events
        .iter()
        .filter(|event| {
            !event.is_cancelled
                && !event.is_all_day
                && !matches!(event.show_as.as_deref(), Some("free"))
        })
        .filter_map(|event| {
            match (
                parse_graph_time(&event.start),
                parse_graph_time(&event.end),
            ) {
                (Some(start), Some(end)) => Some((start, end)),
                _ => {
                    warn!("skipping event {:?} with unparseable times", event.id);
                    None
                }
            }
        })
        .collect()
}

/// Graph timestamps arrive as `2025-06-17T09:00:00.0000000` in the zone we
/// asked for (UTC, via the Prefer header).
fn parse_graph_time(time: &GraphDateTime) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(&time.date_time, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Deserialize)]
struct CalendarViewResponse {
    #[serde(default)]
    value: Vec<GraphEvent>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphEvent {
    id: Option<String>,
    #[serde(default)]
    is_all_day: bool,
    #[serde(default)]
    is_cancelled: bool,
    show_as: Option<String>,
    start: GraphDateTime,
    end: GraphDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphDateTime {
    date_time: String,
}
