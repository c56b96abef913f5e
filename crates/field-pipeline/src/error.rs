//! Error types for the field pipeline.

use geo_common::{BboxError, BoundingBox};
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised by subsetting, extraction and derivation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No candidate name for a mandatory quantity was found.
    #[error(
        "Required variable '{quantity}' not found. Tried {candidates:?}. Available variables: {available:?}"
    )]
    MissingRequiredVariable {
        quantity: String,
        candidates: Vec<String>,
        /// First 20 variable names of the searched dataset.
        available: Vec<String>,
    },

    #[error("Invalid region: {0}")]
    InvalidRegion(#[from] BboxError),

    #[error("Time index {index} out of range for '{variable}' ({len} steps)")]
    TimeIndexOutOfRange {
        variable: String,
        index: usize,
        len: usize,
    },

    #[error("No grid points of '{variable}' fall inside {bbox}")]
    EmptySubset { variable: String, bbox: BoundingBox },

    #[error("Shape mismatch between '{left}' {left_shape:?} and '{right}' {right_shape:?}")]
    ShapeMismatch {
        left: String,
        left_shape: Vec<usize>,
        right: String,
        right_shape: Vec<usize>,
    },

    #[error("Invalid field '{name}': {message}")]
    InvalidField { name: String, message: String },

    /// A backing dataset failed to read a variable.
    #[error("Failed to read '{variable}': {message}")]
    Dataset { variable: String, message: String },
}

impl PipelineError {
    pub fn dataset(variable: impl Into<String>, message: impl ToString) -> Self {
        PipelineError::Dataset {
            variable: variable.into(),
            message: message.to_string(),
        }
    }
}
