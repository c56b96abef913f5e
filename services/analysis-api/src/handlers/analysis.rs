//! Regional analysis jobs: start, poll, cancel.

use std::sync::Arc;
use std::time::Instant;

use analysis_runner::{new_job_id, AnalysisRequest, CancellationToken, ANALYSIS_PREFIX};
use axum::extract::{Extension, Path};
use axum::Json;
use geo_common::{BoundingBox, DateRange, ServiceError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::ApiResult;
use crate::jobs::{CancelOutcome, JobSnapshot};
use crate::metrics::{self, JobKind};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub include_ai: bool,
    /// `[lon_min, lat_min, lon_max, lat_max]`
    pub bbox: Option<BoundingBox>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub success: bool,
    pub data: JobSnapshot,
}

/// Dates are required; both must parse and be ordered.
pub(crate) fn parse_period(start: Option<&str>, end: Option<&str>) -> ApiResult<DateRange> {
    match (start.map(str::trim), end.map(str::trim)) {
        (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
            Ok(DateRange::parse(start, end)?)
        }
        _ => Err(ServiceError::MissingParameter("start_date and end_date".to_string()).into()),
    }
}

pub(crate) fn resolve_bbox(state: &AppState, bbox: Option<BoundingBox>) -> ApiResult<BoundingBox> {
    let bbox = bbox.unwrap_or(state.default_bbox);
    bbox.validate()?;
    Ok(bbox)
}

/// POST /api/analyze
pub async fn analyze_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let dates = parse_period(body.start_date.as_deref(), body.end_date.as_deref())?;
    let bbox = resolve_bbox(&state, body.bbox)?;

    let request = AnalysisRequest {
        id: new_job_id(ANALYSIS_PREFIX),
        dates,
        bbox,
        include_ai: body.include_ai,
    };
    let cancel = state.jobs.create(&request.id, "Starting analysis...").await;
    metrics::record_started(JobKind::Analysis);
    info!(
        analysis_id = %request.id,
        dates = %dates,
        bbox = %bbox,
        include_ai = request.include_ai,
        "Analysis started"
    );

    let analysis_id = request.id.clone();
    tokio::spawn(run_analysis(Arc::clone(&state), request, cancel));

    Ok(Json(AnalyzeResponse {
        success: true,
        analysis_id,
        message: "Analysis started".to_string(),
    }))
}

async fn run_analysis(state: Arc<AppState>, request: AnalysisRequest, cancel: CancellationToken) {
    let started = Instant::now();
    let sink = state.jobs.sink(&request.id);

    match state.runner.run(&request, &sink, &cancel).await {
        Ok(outcome) => match serde_json::to_value(&outcome) {
            Ok(result) => {
                state
                    .jobs
                    .complete(&request.id, "Analysis complete!", result)
                    .await;
                metrics::record_completed(JobKind::Analysis, started.elapsed());
            }
            Err(e) => {
                error!(analysis_id = %request.id, error = %e, "Failed to encode result");
                state
                    .jobs
                    .fail(&request.id, format!("Analysis error: {}", e))
                    .await;
                metrics::record_failed(JobKind::Analysis);
            }
        },
        Err(e) if e.is_cancelled() => {
            warn!(analysis_id = %request.id, "Analysis cancelled");
            state.jobs.mark_cancelled(&request.id).await;
            metrics::record_cancelled(JobKind::Analysis);
        }
        Err(e) => {
            error!(analysis_id = %request.id, error = %e, "Analysis failed");
            state
                .jobs
                .fail(&request.id, format!("Analysis error: {}", e))
                .await;
            metrics::record_failed(JobKind::Analysis);
        }
    }
}

/// GET /api/progress/:id and GET /api/prediction-progress/:id
pub async fn progress_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProgressResponse>> {
    let data = state
        .jobs
        .get(&id)
        .await
        .ok_or_else(|| ServiceError::NotFound("Analysis not found".to_string()))?;
    Ok(Json(ProgressResponse { success: true, data }))
}

/// DELETE /api/analysis/:id
pub async fn cancel_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    match state.jobs.cancel(&id).await {
        None => Err(ServiceError::NotFound("Analysis not found".to_string()).into()),
        Some(CancelOutcome::Cancelled) => {
            info!(analysis_id = %id, "Cancellation requested");
            Ok(Json(json!({
                "success": true,
                "message": "Analysis cancelled",
            })))
        }
        Some(CancelOutcome::AlreadyFinished(status)) => Ok(Json(json!({
            "success": false,
            "message": format!("Analysis already finished ({})", status),
        }))),
    }
}
