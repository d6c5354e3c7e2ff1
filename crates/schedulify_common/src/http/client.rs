// --- File: crates/schedulify_common/src/http/client.rs ---
use reqwest::{Client, Error as ReqwestError};
use std::time::Duration;

/// Creates a new HTTP client with an explicit timeout.
///
/// Provider adapters use this so every external call carries its own
/// timeout rather than hanging on a slow vendor.
pub fn create_client(timeout: Duration) -> Result<Client, ReqwestError> {
    Client::builder().timeout(timeout).build()
}
