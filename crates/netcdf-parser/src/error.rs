//! Error types for NetCDF reading.

use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Variable layout the reader does not handle
    #[error("Unsupported layout for '{variable}': dimensions {dims:?}")]
    UnsupportedLayout { variable: String, dims: Vec<String> },
}

impl From<NetCdfError> for field_pipeline::PipelineError {
    fn from(err: NetCdfError) -> Self {
        let variable = match &err {
            NetCdfError::UnsupportedLayout { variable, .. } => variable.clone(),
            _ => String::new(),
        };
        field_pipeline::PipelineError::dataset(variable, err)
    }
}
