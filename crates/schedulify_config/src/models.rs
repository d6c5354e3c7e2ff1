// --- File: crates/schedulify_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8086,
        }
    }
}

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. loaded via SCHEDULIFY_DATABASE__URL
}

// --- Scheduling Config ---
// Business hours, break window, and slot-walk parameters. The defaults are
// the values the public booking path has always used; a deployment can
// override any of them per environment.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchedulingConfig {
    /// IANA zone the organization's business hours are expressed in.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Start of the working day, "HH:MM".
    #[serde(default = "default_business_start")]
    pub business_hours_start: String,
    /// End of the working day, "HH:MM".
    #[serde(default = "default_business_end")]
    pub business_hours_end: String,
    /// Start of the daily break treated as busy, "HH:MM".
    #[serde(default = "default_break_start")]
    pub break_start: String,
    /// End of the daily break, "HH:MM".
    #[serde(default = "default_break_end")]
    pub break_end: String,
    /// Shortest allowed lead time between "now" and a bookable slot start.
    #[serde(default = "default_minimum_notice")]
    pub minimum_notice_minutes: i64,
    /// Candidate slot starts are emitted on this increment.
    #[serde(default = "default_slot_increment")]
    pub slot_increment_minutes: i64,
    /// Busy intervals closer together than this merge into one.
    #[serde(default = "default_merge_tolerance")]
    pub merge_tolerance_minutes: i64,
    /// Response size bound; the walk is chronological so nearer slots win.
    #[serde(default = "default_max_slots")]
    pub max_slots: usize,
    /// How many calendar days ahead of "now" the slot search covers.
    #[serde(default = "default_search_window_days")]
    pub search_window_days: i64,
    /// How long an issued link stays open.
    #[serde(default = "default_link_ttl_days")]
    pub link_ttl_days: i64,
}

fn default_time_zone() -> String {
    "Europe/Zurich".to_string()
}
fn default_business_start() -> String {
    "09:00".to_string()
}
fn default_business_end() -> String {
    "17:00".to_string()
}
fn default_break_start() -> String {
    "12:00".to_string()
}
fn default_break_end() -> String {
    "13:00".to_string()
}
fn default_minimum_notice() -> i64 {
    60
}
fn default_slot_increment() -> i64 {
    30
}
fn default_merge_tolerance() -> i64 {
    5
}
fn default_max_slots() -> usize {
    24
}
fn default_search_window_days() -> i64 {
    14
}
fn default_link_ttl_days() -> i64 {
    14
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            business_hours_start: default_business_start(),
            business_hours_end: default_business_end(),
            break_start: default_break_start(),
            break_end: default_break_end(),
            minimum_notice_minutes: default_minimum_notice(),
            slot_increment_minutes: default_slot_increment(),
            merge_tolerance_minutes: default_merge_tolerance(),
            max_slots: default_max_slots(),
            search_window_days: default_search_window_days(),
            link_ttl_days: default_link_ttl_days(),
        }
    }
}

// --- Provider Config ---
// Non-secret endpoint configuration for the calendar vendors. OAuth client
// secrets live with the credential store, not here.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderEndpointConfig {
    /// API base URL override, mainly for tests pointing at a local stub.
    pub base_url: Option<String>,
    /// Per-call timeout in seconds.
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_provider_timeout() -> u64 {
    10
}

impl Default for ProviderEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_provider_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub google: ProviderEndpointConfig,
    #[serde(default)]
    pub microsoft: ProviderEndpointConfig,
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub scheduling: SchedulingConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,
}
