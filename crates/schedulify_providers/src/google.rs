// --- File: crates/schedulify_providers/src/google.rs ---
//! Google Calendar adapter.
//!
//! Uses the freeBusy query, which asks for all of a connection's selected
//! calendars in a single request and already excludes cancelled events and
//! events marked free; tentative events are reported busy by the API, which
//! matches the inclusion rules here.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use schedulify_common::http::create_client;
use schedulify_common::services::{
    BoxFuture, BusyPeriod, CalendarAccount, CalendarProvider, CredentialStore, ProviderError,
};
use schedulify_config::ProviderEndpointConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::credentials::fetch_with_refresh;

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

pub struct GoogleCalendarProvider {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl GoogleCalendarProvider {
    pub fn new(credentials: Arc<dyn CredentialStore>, config: &ProviderEndpointConfig) -> Self {
        let http = create_client(StdDuration::from_secs(config.timeout_secs))
            .expect("Failed to create HTTP client");
        Self {
            http,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| CALENDAR_API_BASE.to_string()),
            credentials,
        }
    }

    async fn query_free_busy(
        &self,
        token: &str,
        calendar_ids: &[String],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BusyPeriod>, ProviderError> {
        let url = format!("{}/freeBusy", self.base_url);
        let request = FreeBusyRequest {
            time_min: window_start.to_rfc3339(),
            time_max: window_end.to_rfc3339(),
            time_zone: "UTC".to_string(),
            items: calendar_ids
                .iter()
                .map(|id| FreeBusyItem { id: id.clone() })
                .collect(),
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

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
        let parsed: FreeBusyResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(format!("freeBusy parse failed: {e}")))?;

        Ok(busy_from_response(parsed))
    }
}

impl CalendarProvider for GoogleCalendarProvider {
    fn fetch_busy(
        &self,
        account: &CalendarAccount,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BusyPeriod>, ProviderError> {
        let account = account.clone();
        Box::pin(async move {
            fetch_with_refresh(self.credentials.as_ref(), &account, |token| {
                let calendar_ids = account.calendar_ids.clone();
                async move {
                    self.query_free_busy(&token, &calendar_ids, window_start, window_end)
                        .await
                }
            })
            .await
        })
    }
}

pub(crate) fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout("request timeout".to_string())
    } else if err.is_connect() {
        ProviderError::Transport(format!("connection failed: {err}"))
    } else {
        ProviderError::Transport(format!("request failed: {err}"))
    }
}

/// Unions the per-calendar busy arrays into one sorted list, skipping
/// periods the API reported without both endpoints.
fn busy_from_response(response: FreeBusyResponse) -> Vec<BusyPeriod> {
    let mut periods = Vec::new();
    for (calendar_id, info) in response.calendars {
        if !info.errors.is_empty() {
            warn!(
                "freeBusy reported {} errors for calendar {}",
                info.errors.len(),
                calendar_id
            );
        }
        for entry in info.busy {
            match (parse_instant(&entry.start), parse_instant(&entry.end)) {
                (Some(start), Some(end)) => periods.push((start, end)),
                _ => warn!(
                    "skipping busy period with unparseable bounds in {}",
                    calendar_id
                ),
            }
        }
    }
    periods.sort_by_key(|(start, _)| *start);
    periods
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FreeBusyRequest {
    time_min: String,
    time_max: String,
    time_zone: String,
    items: Vec<FreeBusyItem>,
}

#[derive(Debug, Serialize)]
struct FreeBusyItem {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: std::collections::BTreeMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<FreeBusyEntry>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyEntry {
    start: String,
    end: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unions_busy_across_selected_calendars() {
        let json = r#"{
            "kind": "calendar#freeBusy",
            "calendars": {
                "primary": {
                    "busy": [
                        {"start": "2025-06-17T09:00:00Z", "end": "2025-06-17T10:30:00Z"}
                    ]
                },
                "team@example.com": {
                    "busy": [
                        {"start": "2025-06-17T07:00:00Z", "end": "2025-06-17T08:00:00Z"}
                    ]
                }
            }
        }"#;

        let response: FreeBusyResponse = serde_json::from_str(json).unwrap();
        let periods = busy_from_response(response);
        assert_eq!(periods.len(), 2);
        // sorted by start regardless of calendar order
        assert!(periods[0].0 < periods[1].0);
    }

    #[test]
    fn skips_malformed_periods_and_keeps_the_rest() {
        let json = r#"{
            "calendars": {
                "primary": {
                    "busy": [
                        {"start": "not-a-time", "end": "2025-06-17T10:30:00Z"},
                        {"start": "2025-06-17T13:00:00Z", "end": "2025-06-17T14:00:00Z"}
                    ],
                    "errors": [{"domain": "global", "reason": "notFound"}]
                }
            }
        }"#;

        let response: FreeBusyResponse = serde_json::from_str(json).unwrap();
        let periods = busy_from_response(response);
        assert_eq!(periods.len(), 1);
    }

    #[test]
    fn empty_calendar_map_yields_no_busy_time() {
        let response: FreeBusyResponse = serde_json::from_str("{}").unwrap();
        assert!(busy_from_response(response).is_empty());
    }

    #[test]
    fn request_body_uses_the_wire_field_names() {
        let request = FreeBusyRequest {
            time_min: "2025-06-17T00:00:00+00:00".to_string(),
            time_max: "2025-06-18T00:00:00+00:00".to_string(),
            time_zone: "UTC".to_string(),
            items: vec![FreeBusyItem {
                id: "primary".to_string(),
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("timeMin").is_some());
        assert!(value.get("timeZone").is_some());
        assert_eq!(value["items"][0]["id"], "primary");
    }
}
