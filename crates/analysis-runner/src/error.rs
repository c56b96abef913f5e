//! Error types for analysis runs.

use thiserror::Error;

/// Errors that can end an analysis run.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Data processing failed: {0}")]
    Pipeline(#[from] field_pipeline::PipelineError),

    #[error("Data retrieval failed: {0}")]
    Provider(#[from] data_provider::ProviderError),

    #[error("Map rendering failed: {0}")]
    Render(#[from] renderer::RenderError),

    #[error("Advisory failed: {0}")]
    Advisory(#[from] advisory::AdvisoryError),

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Failed to write results: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl RunnerError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunnerError::Cancelled)
    }
}

/// Result type for analysis runs.
pub type Result<T> = std::result::Result<T, RunnerError>;
