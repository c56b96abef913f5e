//! Job metrics.
//!
//! Counters and histograms go to the global `metrics` recorder; the binary
//! installs the Prometheus exporter and serves it on `/metrics`.

use std::time::Duration;

use metrics::{counter, histogram};

/// Kind label for job metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Analysis,
    Prediction,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Analysis => "analysis",
            JobKind::Prediction => "prediction",
        }
    }
}

pub fn record_started(kind: JobKind) {
    counter!("analyses_started_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_completed(kind: JobKind, elapsed: Duration) {
    counter!("analyses_completed_total", "kind" => kind.as_str()).increment(1);
    histogram!("analysis_duration_seconds", "kind" => kind.as_str()).record(elapsed.as_secs_f64());
}

pub fn record_failed(kind: JobKind) {
    counter!("analyses_failed_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_cancelled(kind: JobKind) {
    counter!("analyses_cancelled_total", "kind" => kind.as_str()).increment(1);
}
