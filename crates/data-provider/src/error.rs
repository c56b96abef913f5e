//! Error types for dataset providers.

use thiserror::Error;

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The search for a required collection returned nothing.
    #[error("No results for {short_name} {dates} @ bbox={bbox}")]
    NoResults {
        short_name: String,
        dates: String,
        bbox: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf_parser::NetCdfError),

    #[error("Download of {url} failed after {attempts} attempts: {message}")]
    DownloadFailed {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("Provider configuration error: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Task(String),
}
