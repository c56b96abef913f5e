//! In-memory job registry.
//!
//! One record per job id. Each update replaces the record's snapshot under
//! the write lock. Progress never decreases, and a terminal record
//! (completed, error, cancelled) accepts no further updates. Terminal
//! records are evicted once they are older than the retention period.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use analysis_runner::{JobStatus, ProgressSink, ProgressUpdate};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// What pollers see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub result: Option<serde_json::Value>,
}

struct JobEntry {
    snapshot: JobSnapshot,
    cancel: CancellationToken,
    /// Set when the record turns terminal
    finished_at: Option<Instant>,
}

/// Outcome of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    AlreadyFinished(JobStatus),
}

#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<String, JobEntry>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job at progress 0 and return its cancellation token.
    pub async fn create(&self, id: &str, message: impl Into<String>) -> CancellationToken {
        let cancel = CancellationToken::new();
        let entry = JobEntry {
            snapshot: JobSnapshot {
                status: JobStatus::Started,
                progress: 0,
                message: message.into(),
                result: None,
            },
            cancel: cancel.clone(),
            finished_at: None,
        };
        self.jobs.write().await.insert(id.to_string(), entry);
        cancel
    }

    pub async fn get(&self, id: &str) -> Option<JobSnapshot> {
        self.jobs.read().await.get(id).map(|e| e.snapshot.clone())
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.jobs.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Apply a stage update. An update behind the recorded progress is
    /// dropped whole, so status and message stay consistent with progress.
    pub async fn update(&self, id: &str, update: ProgressUpdate) {
        self.modify(id, |snapshot| {
            if update.progress < snapshot.progress {
                debug!(
                    recorded = snapshot.progress,
                    late = update.progress,
                    "Ignoring stale progress update"
                );
                return;
            }
            snapshot.progress = update.progress;
            snapshot.status = update.status;
            snapshot.message = update.message;
        })
        .await;
    }

    /// Mark completed with the final result.
    pub async fn complete(&self, id: &str, message: impl Into<String>, result: serde_json::Value) {
        let message = message.into();
        self.modify(id, |snapshot| {
            snapshot.status = JobStatus::Completed;
            snapshot.progress = 100;
            snapshot.message = message;
            snapshot.result = Some(result);
        })
        .await;
    }

    /// Mark failed; the last progress value is kept.
    pub async fn fail(&self, id: &str, message: impl Into<String>) {
        let message = message.into();
        self.modify(id, |snapshot| {
            snapshot.status = JobStatus::Error;
            snapshot.message = message;
            snapshot.result = None;
        })
        .await;
    }

    /// Mark cancelled after the worker stopped.
    pub async fn mark_cancelled(&self, id: &str) {
        self.modify(id, |snapshot| {
            snapshot.status = JobStatus::Cancelled;
            snapshot.message = "Analysis cancelled".to_string();
        })
        .await;
    }

    /// Trigger a job's cancellation token.
    ///
    /// `None` for an unknown id. The record turns `cancelled` right away so
    /// pollers stop even if the worker is inside a long stage.
    pub async fn cancel(&self, id: &str) -> Option<CancelOutcome> {
        let mut jobs = self.jobs.write().await;
        let entry = jobs.get_mut(id)?;
        if entry.snapshot.status.is_terminal() {
            return Some(CancelOutcome::AlreadyFinished(entry.snapshot.status));
        }
        entry.cancel.cancel();
        entry.snapshot.status = JobStatus::Cancelled;
        entry.snapshot.message = "Analysis cancelled".to_string();
        entry.finished_at = Some(Instant::now());
        Some(CancelOutcome::Cancelled)
    }

    /// Drop terminal records finished longer than `retention` ago.
    ///
    /// Returns the number of records removed. Running jobs are kept.
    pub async fn evict_finished(&self, retention: Duration) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, entry| match entry.finished_at {
            Some(finished) => finished.elapsed() < retention,
            None => true,
        });
        before - jobs.len()
    }

    /// Run [`JobStore::evict_finished`] every `every` in the background.
    pub fn spawn_eviction(&self, retention: Duration, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            info!(
                retention_secs = retention.as_secs(),
                interval_secs = every.as_secs(),
                "Starting job eviction task"
            );
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = store.evict_finished(retention).await;
                if removed > 0 {
                    info!(removed, remaining = store.len().await, "Evicted finished jobs");
                }
            }
        })
    }

    async fn modify(&self, id: &str, apply: impl FnOnce(&mut JobSnapshot)) {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id) {
            Some(entry) if !entry.snapshot.status.is_terminal() => {
                apply(&mut entry.snapshot);
                if entry.snapshot.status.is_terminal() {
                    entry.finished_at = Some(Instant::now());
                }
            }
            Some(_) => debug!(job_id = id, "Ignoring update for finished job"),
            None => debug!(job_id = id, "Ignoring update for unknown job"),
        }
    }

    /// Progress sink writing into this store.
    pub fn sink(&self, id: &str) -> JobProgress {
        JobProgress {
            store: self.clone(),
            id: id.to_string(),
        }
    }
}

/// Reports a runner's progress into the store.
pub struct JobProgress {
    store: JobStore,
    id: String,
}

#[async_trait]
impl ProgressSink for JobProgress {
    async fn report(&self, update: ProgressUpdate) {
        // Completion is written together with the result by the worker
        if update.status == JobStatus::Completed {
            return;
        }
        self.store.update(&self.id, update).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let store = JobStore::new();
        store.create("a", "Starting").await;

        store
            .update("a", ProgressUpdate::new(JobStatus::Processing, 40, "Processing"))
            .await;
        store
            .update("a", ProgressUpdate::new(JobStatus::FetchingData, 20, "Late update"))
            .await;

        let snapshot = store.get("a").await.unwrap();
        assert_eq!(snapshot.progress, 40);
        assert_eq!(snapshot.status, JobStatus::Processing);
        assert_eq!(snapshot.message, "Processing");

        store
            .update("a", ProgressUpdate::new(JobStatus::Summarizing, 60, "Summary"))
            .await;
        let snapshot = store.get("a").await.unwrap();
        assert_eq!(snapshot.progress, 60);
        assert_eq!(snapshot.status, JobStatus::Summarizing);
    }

    #[tokio::test]
    async fn test_evict_finished_keeps_running_jobs() {
        let store = JobStore::new();
        store.create("running", "Starting").await;
        store.create("done", "Starting").await;
        store.create("failed", "Starting").await;
        store.create("stopped", "Starting").await;
        store.complete("done", "Done", serde_json::json!({})).await;
        store.fail("failed", "boom").await;
        store.cancel("stopped").await;

        assert_eq!(store.evict_finished(Duration::from_secs(3600)).await, 0);
        assert_eq!(store.len().await, 4);

        assert_eq!(store.evict_finished(Duration::ZERO).await, 3);
        assert!(store.contains("running").await);
        assert!(!store.contains("done").await);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_progress() {
        let store = JobStore::new();
        store.create("a", "Starting").await;
        store
            .update("a", ProgressUpdate::new(JobStatus::Summarizing, 60, "Summary"))
            .await;
        store.fail("a", "boom").await;

        let snapshot = store.get("a").await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Error);
        assert_eq!(snapshot.progress, 60);
        assert!(snapshot.result.is_none());
    }

    #[tokio::test]
    async fn test_terminal_record_is_frozen() {
        let store = JobStore::new();
        store.create("a", "Starting").await;
        store.complete("a", "Done", serde_json::json!({"ok": true})).await;
        store.fail("a", "late failure").await;

        let snapshot = store.get("a").await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.result, Some(serde_json::json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_cancel() {
        let store = JobStore::new();
        assert_eq!(store.cancel("missing").await, None);

        let token = store.create("a", "Starting").await;
        assert_eq!(store.cancel("a").await, Some(CancelOutcome::Cancelled));
        assert!(token.is_cancelled());
        assert_eq!(store.get("a").await.unwrap().status, JobStatus::Cancelled);
        assert_eq!(
            store.cancel("a").await,
            Some(CancelOutcome::AlreadyFinished(JobStatus::Cancelled))
        );
    }

    #[tokio::test]
    async fn test_sink_skips_completion() {
        let store = JobStore::new();
        store.create("a", "Starting").await;
        let sink = store.sink("a");
        sink.report(ProgressUpdate::new(JobStatus::Completed, 100, "done")).await;

        let snapshot = store.get("a").await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Started);
        assert_eq!(snapshot.progress, 0);
    }
}
