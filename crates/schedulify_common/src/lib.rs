// --- File: crates/schedulify_common/src/lib.rs ---
//! Shared building blocks for the Schedulify workspace: the service traits
//! implemented by provider adapters and injected collaborators, the common
//! error taxonomy, logging setup, and HTTP client helpers.

pub mod error;
pub mod http;
pub mod logging;
pub mod services;

pub use error::{HttpStatusCode, SchedulifyError};
