//! Error types for the HTTP and CLI boundaries.

use thiserror::Error;

use crate::bbox::BboxError;
use crate::dates::DateParseError;

/// Result type alias using ServiceError.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to API clients.
#[derive(Debug, Error)]
pub enum ServiceError {
    // === Request Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // === Data Errors ===
    #[error("Data not available: {0}")]
    DataNotAvailable(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ServiceError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ServiceError::MissingParameter(_)
            | ServiceError::InvalidParameter { .. }
            | ServiceError::InvalidRegion(_)
            | ServiceError::InvalidDate(_) => 400,

            ServiceError::NotFound(_) | ServiceError::DataNotAvailable(_) => 404,

            ServiceError::ServiceUnavailable(_) => 503,

            ServiceError::InternalError(_) => 500,
        }
    }
}

impl From<BboxError> for ServiceError {
    fn from(err: BboxError) -> Self {
        ServiceError::InvalidRegion(err.to_string())
    }
}

impl From<DateParseError> for ServiceError {
    fn from(err: DateParseError) -> Self {
        ServiceError::InvalidDate(err.to_string())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::InternalError(format!("JSON error: {}", err))
    }
}
