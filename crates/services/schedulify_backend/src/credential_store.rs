// File: services/schedulify_backend/src/credential_store.rs
//! The credential store wired into the provider adapters.
//!
//! Reads always consult storage so a token refreshed by another running
//! instance is picked up immediately. Refresh itself belongs to the OAuth
//! integration that owns the provider grants; this store declines it, which
//! the adapters surface as an expired-authorization condition and the busy
//! aggregator degrades around.

use schedulify_common::services::{BoxFuture, CalendarAccount, CredentialError, CredentialStore};
use schedulify_db::repositories::{CalendarConnectionRepository, SqlCalendarConnectionRepository};

pub struct StoredCredentialStore {
    connections: SqlCalendarConnectionRepository,
}

impl StoredCredentialStore {
    pub fn new(connections: SqlCalendarConnectionRepository) -> Self {
        Self { connections }
    }
}

impl CredentialStore for StoredCredentialStore {
    fn access_token(&self, account: &CalendarAccount) -> BoxFuture<'_, String, CredentialError> {
        let owner = account.owner_ref.clone();
        let snapshot = account.access_token.clone();
        Box::pin(async move {
            match self.connections.find_by_owner(&owner).await {
                Ok(Some(connection)) => Ok(connection.access_token),
                Ok(None) => Ok(snapshot),
                Err(err) => Err(CredentialError::Storage(err.to_string())),
            }
        })
    }

    fn refresh(&self, account: &CalendarAccount) -> BoxFuture<'_, String, CredentialError> {
        let owner = account.owner_ref.clone();
        Box::pin(async move { Err(CredentialError::NotRefreshable(owner)) })
    }
}
