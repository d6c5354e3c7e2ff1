// --- File: crates/schedulify_providers/src/lib.rs ---
//! Calendar provider adapters.
//!
//! One [`CalendarProvider`] implementation per external vendor, plus the
//! registry that selects an implementation from a connection's stored
//! provider tag. Adapters convert every transport failure into a
//! [`ProviderError`](schedulify_common::services::ProviderError) before it
//! crosses this crate's boundary, and handle token expiry with exactly one
//! refresh and one retry per call.

pub mod credentials;
pub mod google;
pub mod microsoft;

use std::sync::Arc;

use schedulify_common::services::{CalendarProvider, CredentialStore, ProviderKind, ProviderRegistry};
use schedulify_config::ProvidersConfig;

pub use google::GoogleCalendarProvider;
pub use microsoft::MicrosoftCalendarProvider;

/// The full adapter set, one instance per vendor, no shared mutable state.
pub struct CalendarProviders {
    google: Arc<GoogleCalendarProvider>,
    microsoft: Arc<MicrosoftCalendarProvider>,
}

impl CalendarProviders {
    pub fn new(credentials: Arc<dyn CredentialStore>, config: &ProvidersConfig) -> Self {
        Self {
            google: Arc::new(GoogleCalendarProvider::new(
                credentials.clone(),
                &config.google,
            )),
            microsoft: Arc::new(MicrosoftCalendarProvider::new(
                credentials,
                &config.microsoft,
            )),
        }
    }
}

impl ProviderRegistry for CalendarProviders {
    fn provider(&self, kind: ProviderKind) -> Option<Arc<dyn CalendarProvider>> {
        match kind {
            ProviderKind::Google => Some(self.google.clone()),
            ProviderKind::Microsoft => Some(self.microsoft.clone()),
        }
    }
}
