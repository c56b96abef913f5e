//! Progress reporting for staged runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Stage of a job, as reported to pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Started,
    FetchingData,
    Processing,
    Summarizing,
    Rendering,
    AiAnalysis,
    /// Personalized runs report a single running status
    Running,
    Completed,
    Error,
    Cancelled,
}

impl JobStatus {
    /// No further updates follow a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error | JobStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Started => "started",
            JobStatus::FetchingData => "fetching_data",
            JobStatus::Processing => "processing",
            JobStatus::Summarizing => "summarizing",
            JobStatus::Rendering => "rendering",
            JobStatus::AiAnalysis => "ai_analysis",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub status: JobStatus,
    /// Percent complete, 0-100
    pub progress: u8,
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(status: JobStatus, progress: u8, message: impl Into<String>) -> Self {
        Self {
            status,
            progress: progress.min(100),
            message: message.into(),
        }
    }
}

/// Receives progress for one job.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, update: ProgressUpdate);
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

#[async_trait]
impl ProgressSink for NoProgress {
    async fn report(&self, _update: ProgressUpdate) {}
}

/// Logs every update; used by the command-line tool.
#[derive(Debug, Clone, Default)]
pub struct LogProgress {
    pub job_id: String,
}

#[async_trait]
impl ProgressSink for LogProgress {
    async fn report(&self, update: ProgressUpdate) {
        info!(
            job_id = %self.job_id,
            status = %update.status,
            progress = update.progress,
            "{}",
            update.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&JobStatus::FetchingData).unwrap(), "\"fetching_data\"");
        assert_eq!(serde_json::to_string(&JobStatus::AiAnalysis).unwrap(), "\"ai_analysis\"");
        assert_eq!(JobStatus::Rendering.to_string(), "rendering");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn test_progress_is_capped() {
        assert_eq!(ProgressUpdate::new(JobStatus::Completed, 140, "done").progress, 100);
    }
}
