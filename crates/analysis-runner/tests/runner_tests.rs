//! Integration tests for staged analysis runs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use advisory::{Advisory, AdvisoryError, NoAdvisory, UserProfile};
use analysis_runner::{
    list_history, new_job_id, AnalysisRequest, AnalysisRunner, CancellationToken, JobStatus,
    NoProgress, PersonalizedRequest, ProgressSink, ProgressUpdate, RunnerError, ANALYSIS_PREFIX,
    PREDICTION_PREFIX,
};
use async_trait::async_trait;
use data_provider::{DataProvider, ProviderError};
use field_pipeline::{Dataset, MemoryDataset, SummaryRecord};
use geo_common::{BoundingBox, DateRange};
use renderer::PngRenderer;
use test_utils::*;

// =============================================================================
// Test doubles
// =============================================================================

/// Serves in-memory datasets keyed by short name.
struct MockProvider {
    datasets: HashMap<String, MemoryDataset>,
    requested: Mutex<Vec<(String, DateRange)>>,
}

impl MockProvider {
    fn anatolia(with_optional: bool) -> Self {
        let spec = grid::ANATOLIA;
        let (w, h) = (spec.width, spec.height);
        let mut datasets = HashMap::new();
        datasets.insert(
            "M2T1NXSLV".to_string(),
            MemoryDataset::new()
                .with_field(gridded_field("T2M", &spec, create_temperature_grid(w, h)))
                .with_field(gridded_field("U10M", &spec, create_u_wind_grid(w, h)))
                .with_field(gridded_field("V10M", &spec, create_v_wind_grid(w, h))),
        );
        if with_optional {
            datasets.insert(
                "M2T1NXFLX".to_string(),
                MemoryDataset::new().with_field(gridded_field(
                    "PRECTOT",
                    &spec,
                    create_precipitation_rate_grid(w, h, 3),
                )),
            );
            datasets.insert(
                "M2T1NXLND".to_string(),
                MemoryDataset::new().with_field(gridded_field(
                    "GWETROOT",
                    &spec,
                    create_soil_moisture_grid(w, h),
                )),
            );
        }
        Self {
            datasets,
            requested: Mutex::new(Vec::new()),
        }
    }

    fn empty() -> Self {
        Self {
            datasets: HashMap::new(),
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DataProvider for MockProvider {
    async fn open(
        &self,
        short_name: &str,
        dates: &DateRange,
        _bbox: &BoundingBox,
    ) -> data_provider::Result<Option<Box<dyn Dataset>>> {
        self.requested
            .lock()
            .unwrap()
            .push((short_name.to_string(), *dates));
        Ok(self
            .datasets
            .get(short_name)
            .cloned()
            .map(|d| Box::new(d) as Box<dyn Dataset>))
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

/// Returns a fixed answer and records the prompts it saw.
struct FixedAdvisory {
    answer: String,
    prompts: Mutex<Vec<Option<String>>>,
}

impl FixedAdvisory {
    fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Advisory for FixedAdvisory {
    async fn analyze(
        &self,
        _summary: &SummaryRecord,
        custom_prompt: Option<&str>,
    ) -> advisory::Result<Option<String>> {
        self.prompts
            .lock()
            .unwrap()
            .push(custom_prompt.map(str::to_string));
        Ok(Some(self.answer.clone()))
    }

    fn is_configured(&self) -> bool {
        true
    }
}

struct FailingAdvisory;

#[async_trait]
impl Advisory for FailingAdvisory {
    async fn analyze(&self, _: &SummaryRecord, _: Option<&str>) -> advisory::Result<Option<String>> {
        Err(AdvisoryError::Status {
            status: 503,
            body: "overloaded".to_string(),
        })
    }

    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Default)]
struct RecordingSink {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl RecordingSink {
    fn progress_values(&self) -> Vec<u8> {
        self.updates.lock().unwrap().iter().map(|u| u.progress).collect()
    }

    fn last(&self) -> Option<ProgressUpdate> {
        self.updates.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn report(&self, update: ProgressUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

fn runner(provider: MockProvider, advisory: Arc<dyn Advisory>, output: &Path) -> AnalysisRunner {
    AnalysisRunner::new(
        Arc::new(provider),
        Arc::new(PngRenderer::new(output).with_cell_pixels(2)),
        advisory,
        output,
    )
}

fn request(include_ai: bool) -> AnalysisRequest {
    AnalysisRequest {
        id: new_job_id(ANALYSIS_PREFIX),
        dates: DateRange::parse(dates::START, dates::END).unwrap(),
        bbox: bbox::DEFAULT,
        include_ai,
    }
}

// =============================================================================
// Regional analysis
// =============================================================================

#[tokio::test]
async fn test_run_reports_stages_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(MockProvider::anatolia(true), Arc::new(NoAdvisory), dir.path());
    let sink = RecordingSink::default();

    runner
        .run(&request(false), &sink, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sink.progress_values(), vec![20, 40, 60, 70, 80, 100]);
    let statuses: Vec<JobStatus> = sink.updates.lock().unwrap().iter().map(|u| u.status).collect();
    assert_eq!(statuses[0], JobStatus::FetchingData);
    assert_eq!(statuses[4], JobStatus::AiAnalysis);
    assert_eq!(sink.last().unwrap().status, JobStatus::Completed);
    assert_eq!(sink.updates.lock().unwrap()[4].message, "Finishing analysis...");
}

#[tokio::test]
async fn test_run_persists_summary_with_published_paths() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(MockProvider::anatolia(true), Arc::new(NoAdvisory), dir.path())
        .with_public_prefix("/api/files");
    let req = request(false);

    let outcome = runner.run(&req, &NoProgress, &CancellationToken::new()).await.unwrap();

    assert!(outcome.ai_analysis.is_none());
    assert!(outcome.output_path.exists());
    assert_eq!(
        outcome.output_file,
        format!("/api/files/{}.json", req.id)
    );

    let map = outcome.summary.map_path.as_deref().unwrap();
    assert!(map.starts_with("/api/files/weather_map_"));
    assert!(map.ends_with(".png"));
    let quick = outcome.summary.quick_plot_path.as_deref().unwrap();
    assert!(quick.starts_with("/api/files/quick_plot_"));

    let saved: SummaryRecord =
        serde_json::from_str(&std::fs::read_to_string(&outcome.output_path).unwrap()).unwrap();
    assert_eq!(saved.map_path.as_deref(), Some(map));
    assert_eq!(saved.dates, req.dates);
    assert!(saved.temp_mean_c.is_some());
    assert!(saved.precip_mean_mm_per_day.is_some());
    assert!(saved.aod_mean.is_none());

    let pngs = std::fs::read_dir(dir.path())
        .unwrap()
        .flatten()
        .filter(|e| e.path().extension().map_or(false, |x| x == "png"))
        .count();
    assert!(pngs >= 1);
}

#[tokio::test]
async fn test_run_without_prefix_keeps_file_paths() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(MockProvider::anatolia(false), Arc::new(NoAdvisory), dir.path());

    let outcome = runner
        .run(&request(false), &NoProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.output_file, outcome.output_path.display().to_string());
    let map = outcome.summary.map_path.unwrap();
    assert!(Path::new(&map).exists());
}

#[tokio::test]
async fn test_run_with_ai_formats_report() {
    let dir = tempfile::tempdir().unwrap();
    let advisory = Arc::new(FixedAdvisory::new(
        r#"{"summary": "Warm and dry.", "risks": {"agriculture": "crop stress"}, "recommendations": ["irrigate"]}"#,
    ));
    let runner = runner(MockProvider::anatolia(true), advisory.clone(), dir.path());
    let sink = RecordingSink::default();

    let outcome = runner.run(&request(true), &sink, &CancellationToken::new()).await.unwrap();

    let text = outcome.ai_analysis.unwrap();
    assert!(text.contains("WEATHER ANALYSIS"));
    assert!(text.contains("Warm and dry."));
    assert!(text.contains("• Agriculture: crop stress"));
    assert!(text.contains("1. irrigate"));
    assert_eq!(advisory.prompts.lock().unwrap().as_slice(), &[None]);
    assert_eq!(sink.updates.lock().unwrap()[4].message, "Running AI analysis...");
}

#[tokio::test]
async fn test_advisory_failure_falls_back_to_basic_summary() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(MockProvider::anatolia(true), Arc::new(FailingAdvisory), dir.path());

    let outcome = runner
        .run(&request(true), &NoProgress, &CancellationToken::new())
        .await
        .unwrap();

    let text = outcome.ai_analysis.unwrap();
    assert!(text.contains("WEATHER SUMMARY"));
    assert!(text.contains("Mean temperature:"));
}

#[tokio::test]
async fn test_missing_required_collection_fails() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(MockProvider::empty(), Arc::new(NoAdvisory), dir.path());
    let sink = RecordingSink::default();

    let err = runner
        .run(&request(false), &sink, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunnerError::Provider(ProviderError::NoResults { .. })
    ));
    assert_eq!(sink.progress_values(), vec![20]);
    assert!(list_history(dir.path(), "/api/files").unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_run_stops_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::anatolia(true);
    let runner = runner(provider, Arc::new(NoAdvisory), dir.path());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let sink = RecordingSink::default();

    let err = runner.run(&request(false), &sink, &cancel).await.unwrap_err();

    assert!(err.is_cancelled());
    assert!(sink.progress_values().is_empty());
}

// =============================================================================
// Personalized outlook
// =============================================================================

#[tokio::test]
async fn test_personalized_uses_preceding_year_and_labels_period() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::anatolia(true);
    let advisory = Arc::new(FixedAdvisory::new("Dear Deniz, expect mild days."));
    let provider = Arc::new(provider);
    let runner = AnalysisRunner::new(
        provider.clone(),
        Arc::new(PngRenderer::new(dir.path()).with_cell_pixels(2)),
        advisory.clone(),
        dir.path(),
    );
    let period = DateRange::parse("2025-09-01", "2025-09-07").unwrap();
    let profile: UserProfile = serde_json::from_str(
        r#"{"name": "Deniz", "location": "Ankara", "purpose": "agriculture"}"#,
    )
    .unwrap();
    let request = PersonalizedRequest {
        id: new_job_id(PREDICTION_PREFIX),
        period,
        bbox: bbox::DEFAULT,
        custom_query: "Should I harvest this week?".to_string(),
        profile,
    };
    let sink = RecordingSink::default();

    let envelope = runner
        .run_personalized(&request, &sink, &CancellationToken::new())
        .await
        .unwrap();

    let requested = provider.requested.lock().unwrap();
    let window = DateRange::parse("2024-09-01", "2025-08-31").unwrap();
    assert!(requested.iter().all(|(_, dates)| *dates == window));

    assert_eq!(envelope.kind, "personalized_prediction");
    assert_eq!(envelope.base_data.dates, period);
    assert_eq!(envelope.prediction_period.start_date, "2025-09-01");
    assert_eq!(envelope.prediction_period.end_date, "2025-09-07");
    assert_eq!(envelope.user_profile.name.as_deref(), Some("Deniz"));
    assert_eq!(
        envelope.personalized_analysis.as_deref(),
        Some("Dear Deniz, expect mild days.")
    );

    let prompts = advisory.prompts.lock().unwrap();
    let prompt = prompts[0].as_deref().unwrap();
    assert!(prompt.contains("Should I harvest this week?"));
    assert!(prompt.contains("agricultural activities and farming"));

    assert_eq!(sink.progress_values(), vec![10, 30, 50, 70, 90, 100]);
    assert_eq!(sink.last().unwrap().message, "Personalized prediction complete!");

    let saved = dir.path().join(format!("{}.json", request.id));
    assert!(saved.exists());
    // Predictions do not show up in the analysis history
    assert!(list_history(dir.path(), "/api/files").unwrap().is_empty());
}

#[tokio::test]
async fn test_personalized_without_model_keeps_null_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(MockProvider::anatolia(false), Arc::new(NoAdvisory), dir.path());
    let request = PersonalizedRequest {
        id: new_job_id(PREDICTION_PREFIX),
        period: DateRange::default_period(),
        bbox: bbox::DEFAULT,
        custom_query: String::new(),
        profile: UserProfile::default(),
    };

    let envelope = runner
        .run_personalized(&request, &NoProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert!(envelope.personalized_analysis.is_none());
    assert!(envelope.base_data.map_path.is_none());
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn test_history_lists_completed_runs() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(MockProvider::anatolia(false), Arc::new(NoAdvisory), dir.path());

    let first = runner
        .run(&request(false), &NoProgress, &CancellationToken::new())
        .await
        .unwrap();
    let second = runner
        .run(&request(false), &NoProgress, &CancellationToken::new())
        .await
        .unwrap();

    let files = list_history(dir.path(), "/api/files").unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0].created >= files[1].created);
    let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
    assert!(names.contains(&format!("{}.json", first.id).as_str()));
    assert!(names.contains(&format!("{}.json", second.id).as_str()));
    assert_eq!(files[0].dates, serde_json::json!(["2025-09-01", "2025-10-02"]));
}
