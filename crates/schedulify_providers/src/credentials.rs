// --- File: crates/schedulify_providers/src/credentials.rs ---
//! Refresh-once-retry-once credential handling shared by all adapters.

use std::future::Future;

use schedulify_common::services::{BusyPeriod, CalendarAccount, CredentialStore, ProviderError};
use tracing::debug;

/// Runs a vendor query with the stored access token; on an authorization
/// failure, refreshes the token exactly once through the credential store
/// and retries exactly once.
///
/// The store persists the refreshed token before returning it, so a
/// concurrent caller benefits immediately. A second authorization failure
/// surfaces as [`ProviderError::AuthorizationExpired`], distinguishable from
/// generic vendor errors; any non-auth failure passes straight through
/// without consuming the refresh.
pub(crate) async fn fetch_with_refresh<F, Fut>(
    credentials: &dyn CredentialStore,
    account: &CalendarAccount,
    attempt: F,
) -> Result<Vec<BusyPeriod>, ProviderError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Vec<BusyPeriod>, ProviderError>>,
{
    let token = credentials.access_token(account).await?;
    match attempt(token).await {
        Err(ProviderError::AuthorizationExpired { .. }) => {
            debug!(
                "access token rejected for {}; refreshing once",
                account.owner_ref
            );
            let token = credentials.refresh(account).await?;
            attempt(token).await.map_err(|err| match err {
                ProviderError::AuthorizationExpired { .. } => ProviderError::AuthorizationExpired {
                    owner: account.owner_ref.clone(),
                },
                other => other,
            })
        }
        other => other,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use schedulify_common::services::{BoxFuture, CredentialError, ProviderKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory credential store counting its calls.
    pub(crate) struct FakeStore {
        pub current: Mutex<String>,
        pub refreshed: AtomicUsize,
        pub refresh_fails: bool,
    }

    impl FakeStore {
        pub fn new(token: &str) -> Self {
            Self {
                current: Mutex::new(token.to_string()),
                refreshed: AtomicUsize::new(0),
                refresh_fails: false,
            }
        }
    }

    impl CredentialStore for FakeStore {
        fn access_token(
            &self,
            _account: &CalendarAccount,
        ) -> BoxFuture<'_, String, CredentialError> {
            let token = self.current.lock().unwrap().clone();
            Box::pin(async move { Ok(token) })
        }

        fn refresh(&self, account: &CalendarAccount) -> BoxFuture<'_, String, CredentialError> {
            let owner = account.owner_ref.clone();
            Box::pin(async move {
                self.refreshed.fetch_add(1, Ordering::SeqCst);
                if self.refresh_fails {
                    return Err(CredentialError::Rejected(format!("no grant for {owner}")));
                }
                // persist before returning, like the real store
                let mut current = self.current.lock().unwrap();
                *current = "fresh-token".to_string();
                Ok(current.clone())
            })
        }
    }

    pub(crate) fn account() -> CalendarAccount {
        CalendarAccount {
            owner_ref: "user-1".to_string(),
            provider: ProviderKind::Google,
            access_token: "stale-token".to_string(),
            refresh_token: Some("refresh".to_string()),
            token_expires_at: Some(Utc.with_ymd_and_hms(2025, 6, 17, 0, 0, 0).unwrap()),
            calendar_ids: vec!["primary".to_string()],
        }
    }

    fn expired() -> ProviderError {
        ProviderError::AuthorizationExpired {
            owner: "user-1".to_string(),
        }
    }

    #[tokio::test]
    async fn refreshes_once_then_retries_with_the_new_token() {
        let store = FakeStore::new("stale-token");
        let seen = Mutex::new(Vec::new());
        let result = fetch_with_refresh(&store, &account(), |token| {
            seen.lock().unwrap().push(token.clone());
            async move {
                if token == "fresh-token" {
                    Ok(vec![])
                } else {
                    Err(expired())
                }
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(store.refreshed.load(Ordering::SeqCst), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["stale-token".to_string(), "fresh-token".to_string()]
        );
    }

    #[tokio::test]
    async fn second_rejection_surfaces_authorization_expired() {
        let store = FakeStore::new("stale-token");
        let result = fetch_with_refresh(&store, &account(), |_| async { Err(expired()) }).await;
        assert!(matches!(
            result,
            Err(ProviderError::AuthorizationExpired { owner }) if owner == "user-1"
        ));
        assert_eq!(store.refreshed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_auth_errors_do_not_consume_the_refresh() {
        let store = FakeStore::new("stale-token");
        let result = fetch_with_refresh(&store, &account(), |_| async {
            Err(ProviderError::Timeout("slow vendor".to_string()))
        })
        .await;
        assert!(matches!(result, Err(ProviderError::Timeout(_))));
        assert_eq!(store.refreshed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_refresh_propagates_credential_error() {
        let mut store = FakeStore::new("stale-token");
        store.refresh_fails = true;
        let result = fetch_with_refresh(&store, &account(), |_| async { Err(expired()) }).await;
        assert!(matches!(result, Err(ProviderError::Credential(_))));
    }
}
