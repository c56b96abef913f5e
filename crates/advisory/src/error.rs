//! Error types for the advisory client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisoryError>;

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
