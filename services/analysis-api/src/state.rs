//! Application state for the analysis API.

use std::path::PathBuf;
use std::sync::Arc;

use analysis_runner::{AnalysisConfig, AnalysisRunner};
use anyhow::Result;
use geo_common::BoundingBox;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use crate::jobs::JobStore;

/// URL prefix under which the output directory is served.
pub const FILES_PREFIX: &str = "/api/files";

/// Shared application state.
pub struct AppState {
    pub runner: Arc<AnalysisRunner>,

    /// Progress and results of every job started by this process.
    pub jobs: JobStore,

    /// Region used when a request carries none.
    pub default_bbox: BoundingBox,

    /// Directory served under [`FILES_PREFIX`].
    pub output_dir: PathBuf,

    /// Label reported by `/api/status`.
    pub data_source: String,

    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Build the provider, renderer and advisory client from `config`.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let runner = AnalysisRunner::new(
            config.build_provider()?,
            Arc::new(config.build_renderer()),
            config.build_advisory()?,
            &config.output_dir,
        )
        .with_datasets(config.datasets.clone())
        .with_time_index(config.time_index);

        info!(
            output_dir = %config.output_dir.display(),
            data_source = config.data_source.label(),
            advisory = runner.advisory().is_configured(),
            "Analysis runner ready"
        );
        Ok(Self::new(runner, config))
    }

    /// Wrap an existing runner; published paths are rewritten under [`FILES_PREFIX`].
    pub fn new(runner: AnalysisRunner, config: &AnalysisConfig) -> Self {
        Self {
            runner: Arc::new(runner.with_public_prefix(FILES_PREFIX)),
            jobs: JobStore::new(),
            default_bbox: config.bbox,
            output_dir: config.output_dir.clone(),
            data_source: config.data_source.label().to_string(),
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
