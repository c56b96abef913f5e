//! Orchestration of reanalysis analysis runs.
//!
//! Shared by the HTTP service and the command-line tool:
//! - [`AnalysisConfig`]: YAML configuration with environment overrides and
//!   builders for the provider, renderer and advisory client
//! - [`AnalysisRunner`]: staged runs with progress reporting and cancellation
//! - [`list_history`]: persisted results, newest first

pub mod config;
pub mod error;
pub mod history;
pub mod progress;
pub mod runner;

pub use config::{AdvisorySettings, AnalysisConfig, DataSourceConfig, RenderSettings};
pub use error::{Result, RunnerError};
pub use history::{list_history, HistoryEntry};
pub use progress::{JobStatus, LogProgress, NoProgress, ProgressSink, ProgressUpdate};
pub use runner::{
    new_job_id, result_file_name, AnalysisOutcome, AnalysisRequest, AnalysisRunner,
    PersonalizedRequest, PredictionEnvelope, ANALYSIS_PREFIX, PREDICTION_PREFIX,
};

// Re-exported so callers can build cancellation tokens without a direct dependency
pub use tokio_util::sync::CancellationToken;
