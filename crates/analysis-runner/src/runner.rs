//! Staged analysis runs.
//!
//! A run fetches a dataset bundle, derives the indicator fields on a blocking
//! thread, renders the maps, optionally asks the advisory service for
//! commentary and persists the summary as pretty-printed JSON. Progress is
//! reported after every stage and cancellation is honored between stages.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use advisory::{format_analysis, personalized_prompt, Advisory, UserProfile};
use chrono::{Local, Utc};
use data_provider::{fetch_bundle, DataProvider, DatasetNames};
use field_pipeline::{process_bundle, DatasetBundle, ProcessedFields, SummaryRecord};
use geo_common::{BoundingBox, DateRange};
use renderer::Renderer;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::error::{Result, RunnerError};
use crate::progress::{JobStatus, ProgressSink, ProgressUpdate};

pub const ANALYSIS_PREFIX: &str = "analysis";
pub const PREDICTION_PREFIX: &str = "prediction";

/// `<prefix>_<local %Y%m%d_%H%M%S>_<8 hex chars>`.
pub fn new_job_id(prefix: &str) -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        prefix,
        Local::now().format("%Y%m%d_%H%M%S"),
        &uuid[..8]
    )
}

/// File name for a job's persisted JSON: `<prefix>_<id without prefix>.json`.
pub fn result_file_name(prefix: &str, id: &str) -> String {
    let stem = id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(id);
    format!("{}_{}.json", prefix, stem)
}

// =============================================================================
// Requests and outcomes
// =============================================================================

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub id: String,
    pub dates: DateRange,
    pub bbox: BoundingBox,
    /// Ask the advisory service for commentary during the run
    pub include_ai: bool,
}

/// Result of a completed regional analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    #[serde(skip)]
    pub id: String,
    pub summary: SummaryRecord,
    /// Formatted commentary; `None` when not requested
    pub ai_analysis: Option<String>,
    /// Published location of the persisted summary
    pub output_file: String,
    #[serde(skip)]
    pub output_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PersonalizedRequest {
    pub id: String,
    /// Period the outlook is for
    pub period: DateRange,
    pub bbox: BoundingBox,
    pub custom_query: String,
    pub profile: UserProfile,
}

/// Persisted personalized outlook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub user_profile: ProfileEcho,
    pub prediction_period: PredictionPeriod,
    pub base_data: SummaryRecord,
    /// Raw model text, `null` without a model answer
    pub personalized_analysis: Option<String>,
    pub timestamp: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEcho {
    pub name: Option<String>,
    pub location: Option<String>,
    pub purpose: Option<String>,
    pub preferences: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPeriod {
    pub start_date: String,
    pub end_date: String,
}

impl PredictionEnvelope {
    pub const KIND: &'static str = "personalized_prediction";
    pub const VERSION: &'static str = "1.0";

    pub fn new(
        profile: &UserProfile,
        period: &DateRange,
        base_data: SummaryRecord,
        personalized_analysis: Option<String>,
    ) -> Self {
        let preferences = match &profile.prediction_preferences {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other.clone(),
        };
        Self {
            kind: Self::KIND.to_string(),
            user_profile: ProfileEcho {
                name: profile.name.clone(),
                location: profile.location.clone(),
                purpose: profile.purpose.clone(),
                preferences,
            },
            prediction_period: PredictionPeriod {
                start_date: period.start_str(),
                end_date: period.end_str(),
            },
            base_data,
            personalized_analysis,
            timestamp: Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            version: Self::VERSION.to_string(),
        }
    }
}

// =============================================================================
// Runner
// =============================================================================

/// Runs analyses against a provider, renderer and advisory service.
pub struct AnalysisRunner {
    provider: Arc<dyn DataProvider>,
    renderer: Arc<dyn Renderer>,
    advisory: Arc<dyn Advisory>,
    datasets: DatasetNames,
    output_dir: PathBuf,
    time_index: usize,
    /// URL prefix replacing the output directory in published paths
    public_prefix: Option<String>,
}

impl AnalysisRunner {
    pub fn new(
        provider: Arc<dyn DataProvider>,
        renderer: Arc<dyn Renderer>,
        advisory: Arc<dyn Advisory>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            renderer,
            advisory,
            datasets: DatasetNames::default(),
            output_dir: output_dir.into(),
            time_index: 0,
            public_prefix: None,
        }
    }

    pub fn with_datasets(mut self, datasets: DatasetNames) -> Self {
        self.datasets = datasets;
        self
    }

    pub fn with_time_index(mut self, time_index: usize) -> Self {
        self.time_index = time_index;
        self
    }

    /// Publish file paths as `<prefix>/<file name>`, e.g. `/api/files`.
    pub fn with_public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_prefix = Some(prefix.into().trim_end_matches('/').to_string());
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn provider(&self) -> &dyn DataProvider {
        self.provider.as_ref()
    }

    pub fn advisory(&self) -> &dyn Advisory {
        self.advisory.as_ref()
    }

    /// Where `path` is reachable for clients.
    pub fn publish_path(&self, path: &Path) -> String {
        match (&self.public_prefix, path.file_name()) {
            (Some(prefix), Some(name)) => format!("{}/{}", prefix, name.to_string_lossy()),
            _ => path.display().to_string(),
        }
    }

    /// Full regional analysis.
    #[instrument(skip(self, request, progress, cancel), fields(analysis_id = %request.id, dates = %request.dates))]
    pub async fn run(
        &self,
        request: &AnalysisRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutcome> {
        let started = Instant::now();

        checkpoint(cancel)?;
        progress
            .report(ProgressUpdate::new(JobStatus::FetchingData, 20, "Fetching NASA data..."))
            .await;
        let bundle = self.fetch(&request.dates, &request.bbox, cancel).await?;

        checkpoint(cancel)?;
        progress
            .report(ProgressUpdate::new(JobStatus::Processing, 40, "Processing data..."))
            .await;
        let (processed, mut summary) = self
            .process(bundle, request.dates, request.dates, request.bbox)
            .await?;

        checkpoint(cancel)?;
        progress
            .report(ProgressUpdate::new(JobStatus::Summarizing, 60, "Creating summary..."))
            .await;
        info!(
            temp_mean_c = ?summary.temp_mean_c,
            precip_mean = ?summary.precip_mean_mm_per_day,
            drought_index_mean = ?summary.drought_index_mean,
            drought_source = summary.drought_index_source.as_str(),
            "Summary computed"
        );

        checkpoint(cancel)?;
        progress
            .report(ProgressUpdate::new(JobStatus::Rendering, 70, "Drawing maps..."))
            .await;
        let (map_path, quick_path) = self.render(processed, request.dates, request.bbox).await?;
        summary.map_path = Some(self.publish_path(&map_path));
        summary.quick_plot_path = Some(self.publish_path(&quick_path));

        checkpoint(cancel)?;
        let message = if request.include_ai {
            "Running AI analysis..."
        } else {
            "Finishing analysis..."
        };
        progress
            .report(ProgressUpdate::new(JobStatus::AiAnalysis, 80, message))
            .await;
        let ai_analysis = if request.include_ai {
            let text = tokio::select! {
                _ = cancel.cancelled() => return Err(RunnerError::Cancelled),
                text = self.advise(&summary) => text,
            };
            Some(text)
        } else {
            None
        };

        checkpoint(cancel)?;
        let output_path = self
            .save_json(&result_file_name(ANALYSIS_PREFIX, &request.id), &summary)
            .await?;

        progress
            .report(ProgressUpdate::new(JobStatus::Completed, 100, "Analysis complete!"))
            .await;
        info!(
            output = %output_path.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis completed"
        );

        Ok(AnalysisOutcome {
            id: request.id.clone(),
            output_file: self.publish_path(&output_path),
            output_path,
            summary,
            ai_analysis,
        })
    }

    /// Formatted commentary for `summary`.
    ///
    /// Advisory failures are logged and fall back to the basic summary text.
    pub async fn advise(&self, summary: &SummaryRecord) -> String {
        match self.advisory.analyze(summary, None).await {
            Ok(response) => format_analysis(response.as_deref(), summary),
            Err(e) => {
                warn!(error = %e, "Advisory request failed, using basic summary");
                format_analysis(None, summary)
            }
        }
    }

    /// Personalized outlook built from the year before the requested period.
    #[instrument(skip(self, request, progress, cancel), fields(analysis_id = %request.id, period = %request.period))]
    pub async fn run_personalized(
        &self,
        request: &PersonalizedRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PredictionEnvelope> {
        checkpoint(cancel)?;
        progress
            .report(ProgressUpdate::new(JobStatus::Running, 10, "Fetching weather data..."))
            .await;

        let window = request.period.preceding_year();
        info!(window = %window, "Using historical pattern window");

        checkpoint(cancel)?;
        progress
            .report(ProgressUpdate::new(JobStatus::Running, 30, "Analyzing weather patterns..."))
            .await;
        let bundle = self.fetch(&window, &request.bbox, cancel).await?;
        let (_, base_summary) = self
            .process(bundle, window, request.period, request.bbox)
            .await?;

        checkpoint(cancel)?;
        progress
            .report(ProgressUpdate::new(JobStatus::Running, 50, "Creating base forecast..."))
            .await;

        checkpoint(cancel)?;
        progress
            .report(ProgressUpdate::new(
                JobStatus::Running,
                70,
                "Generating personalized insights...",
            ))
            .await;
        let prompt = personalized_prompt(&request.profile, &request.custom_query, &request.period);
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(RunnerError::Cancelled),
            response = self.advisory.analyze(&base_summary, Some(&prompt)) => response,
        };
        let personalized_analysis = match response {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Personalized advisory request failed");
                None
            }
        };

        checkpoint(cancel)?;
        progress
            .report(ProgressUpdate::new(
                JobStatus::Running,
                90,
                "Finalizing personalized prediction...",
            ))
            .await;
        let envelope = PredictionEnvelope::new(
            &request.profile,
            &request.period,
            base_summary,
            personalized_analysis,
        );
        let path = self
            .save_json(&result_file_name(PREDICTION_PREFIX, &request.id), &envelope)
            .await?;

        progress
            .report(ProgressUpdate::new(
                JobStatus::Completed,
                100,
                "Personalized prediction complete!",
            ))
            .await;
        info!(output = %path.display(), "Personalized prediction completed");
        Ok(envelope)
    }

    // =========================================================================
    // Stages
    // =========================================================================

    async fn fetch(
        &self,
        dates: &DateRange,
        bbox: &BoundingBox,
        cancel: &CancellationToken,
    ) -> Result<DatasetBundle> {
        info!(provider = %self.provider.describe(), "Fetching dataset bundle");
        tokio::select! {
            _ = cancel.cancelled() => Err(RunnerError::Cancelled),
            bundle = fetch_bundle(self.provider.as_ref(), dates, bbox, &self.datasets) => Ok(bundle?),
        }
    }

    /// Extraction and derivation on a blocking thread.
    ///
    /// `label` is the period written into the summary.
    async fn process(
        &self,
        bundle: DatasetBundle,
        data_period: DateRange,
        label: DateRange,
        bbox: BoundingBox,
    ) -> Result<(ProcessedFields, SummaryRecord)> {
        let time_index = self.time_index;
        let started = Instant::now();
        let processed = tokio::task::spawn_blocking(move || {
            process_bundle(&bundle, label, bbox, time_index)
        })
        .await
        .map_err(|e| RunnerError::Task(e.to_string()))??;

        info!(
            data_period = %data_period,
            grid = ?processed.0.temperature_c.dim(),
            drought_source = processed.0.drought_strategy.as_str(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fields derived"
        );
        Ok(processed)
    }

    async fn render(
        &self,
        processed: ProcessedFields,
        dates: DateRange,
        bbox: BoundingBox,
    ) -> Result<(PathBuf, PathBuf)> {
        let renderer = Arc::clone(&self.renderer);
        let paths = tokio::task::spawn_blocking(move || {
            let map = renderer.render_map(&processed, &dates, &bbox)?;
            let quick = renderer.render_quick_plot(&processed, &dates, &bbox)?;
            Ok::<_, renderer::RenderError>((map, quick))
        })
        .await
        .map_err(|e| RunnerError::Task(e.to_string()))??;
        Ok(paths)
    }

    async fn save_json<T: Serialize>(&self, file_name: &str, value: &T) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(file_name);
        let json = serde_json::to_string_pretty(value)?;
        tokio::fs::write(&path, json).await?;
        info!(path = %path.display(), saved_at = %Utc::now().to_rfc3339(), "Saved results");
        Ok(path)
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(RunnerError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_shape() {
        let id = new_job_id(ANALYSIS_PREFIX);
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "analysis");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert_eq!(parts[3].len(), 8);
        assert_ne!(new_job_id(ANALYSIS_PREFIX), id);
    }

    #[test]
    fn test_result_file_name_avoids_double_prefix() {
        assert_eq!(
            result_file_name(ANALYSIS_PREFIX, "analysis_20250901_120000_ab12cd34"),
            "analysis_20250901_120000_ab12cd34.json"
        );
        assert_eq!(result_file_name(PREDICTION_PREFIX, "custom"), "prediction_custom.json");
    }

    #[test]
    fn test_envelope_defaults_preferences_to_object() {
        let summary = SummaryRecord {
            bbox: BoundingBox::DEFAULT,
            dates: DateRange::default_period(),
            precip_mean_mm_per_day: None,
            temp_mean_c: Some(20.0),
            wind_mean_m_s: None,
            drought_index_mean: Some(0.0),
            aod_mean: None,
            drought_index_source: field_pipeline::DroughtStrategy::Absent,
            map_path: None,
            quick_plot_path: None,
        };
        let envelope = PredictionEnvelope::new(
            &UserProfile::default(),
            &DateRange::default_period(),
            summary,
            None,
        );
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "personalized_prediction");
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["user_profile"]["preferences"], serde_json::json!({}));
        assert_eq!(json["prediction_period"]["start_date"], "2025-09-01");
        assert!(json["personalized_analysis"].is_null());
    }

    #[test]
    fn test_checkpoint() {
        let token = CancellationToken::new();
        assert!(checkpoint(&token).is_ok());
        token.cancel();
        assert!(checkpoint(&token).unwrap_err().is_cancelled());
    }
}
