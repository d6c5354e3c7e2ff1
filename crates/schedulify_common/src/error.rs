// --- File: crates/schedulify_common/src/error.rs ---
use thiserror::Error;

/// The base error taxonomy shared across Schedulify crates.
///
/// Each crate keeps its own specific error enum and converts into this at
/// the HTTP boundary. The variants mirror the user-visible outcomes of the
/// booking surface, and their display strings are the exact copy shown to
/// the external party; every terminal link state gets its own variant so
/// handlers route to distinct copy.
#[derive(Error, Debug)]
pub enum SchedulifyError {
    /// The token did not resolve to a booking request.
    #[error("Link not found.")]
    NotFound,

    /// The request's deadline has passed.
    #[error("This link has expired. Please contact the office that sent it.")]
    Expired,

    /// The request was already confirmed. Also covers the concurrent-confirm
    /// conflict: functionally the caller belongs on the already-booked view.
    #[error("This link is no longer open.")]
    AlreadyBooked,

    /// The request was cancelled by staff.
    #[error("This link has been cancelled.")]
    Cancelled,

    /// Malformed caller input (bad timestamp, unknown timezone, ...).
    #[error("{0}")]
    Validation(String),

    /// An external calendar or recorder call failed in a way that could not
    /// be degraded away.
    #[error("External service error: {service_name} - {message}")]
    ExternalService {
        service_name: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    /// Details stay server-side; handlers log them and show generic copy.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for SchedulifyError {
    fn status_code(&self) -> u16 {
        match self {
            SchedulifyError::NotFound => 404,
            SchedulifyError::Expired => 410,
            SchedulifyError::AlreadyBooked => 409,
            SchedulifyError::Cancelled => 409,
            SchedulifyError::Validation(_) => 400,
            SchedulifyError::ExternalService { .. } => 502,
            SchedulifyError::Config(_) => 500,
            SchedulifyError::Internal(_) => 500,
        }
    }
}

// Common error conversions
impl From<reqwest::Error> for SchedulifyError {
    fn from(err: reqwest::Error) -> Self {
        SchedulifyError::ExternalService {
            service_name: "http".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SchedulifyError {
    fn from(err: serde_json::Error) -> Self {
        SchedulifyError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_map_to_distinct_client_statuses() {
        assert_eq!(SchedulifyError::NotFound.status_code(), 404);
        assert_eq!(SchedulifyError::Expired.status_code(), 410);
        assert_eq!(SchedulifyError::AlreadyBooked.status_code(), 409);
        assert_eq!(SchedulifyError::Cancelled.status_code(), 409);
    }

    #[test]
    fn expired_copy_points_back_to_the_issuing_office() {
        assert!(SchedulifyError::Expired.to_string().contains("office"));
    }
}
