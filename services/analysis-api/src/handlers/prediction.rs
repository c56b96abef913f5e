//! Personalized prediction jobs.

use std::sync::Arc;
use std::time::Instant;

use advisory::UserProfile;
use analysis_runner::{new_job_id, CancellationToken, PersonalizedRequest, PREDICTION_PREFIX};
use axum::extract::Extension;
use axum::Json;
use geo_common::BoundingBox;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::ApiResult;
use crate::handlers::analysis::{parse_period, resolve_bbox};
use crate::metrics::{self, JobKind};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub custom_query: String,
    #[serde(default)]
    pub user_profile: UserProfile,
    pub bbox: Option<BoundingBox>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub success: bool,
    pub analysis_id: String,
    pub message: String,
}

/// POST /api/personalized-prediction
pub async fn personalized_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<PredictionRequest>,
) -> ApiResult<Json<PredictionResponse>> {
    let period = parse_period(body.start_date.as_deref(), body.end_date.as_deref())?;
    let bbox = resolve_bbox(&state, body.bbox)?;

    let request = PersonalizedRequest {
        id: new_job_id(PREDICTION_PREFIX),
        period,
        bbox,
        custom_query: body.custom_query,
        profile: body.user_profile,
    };
    let cancel = state
        .jobs
        .create(&request.id, "Initializing personalized prediction...")
        .await;
    metrics::record_started(JobKind::Prediction);
    info!(
        analysis_id = %request.id,
        period = %period,
        purpose = request.profile.purpose.as_deref().unwrap_or(""),
        "Personalized prediction started"
    );

    let analysis_id = request.id.clone();
    tokio::spawn(run_prediction(Arc::clone(&state), request, cancel));

    Ok(Json(PredictionResponse {
        success: true,
        analysis_id,
        message: "Personalized prediction started".to_string(),
    }))
}

async fn run_prediction(state: Arc<AppState>, request: PersonalizedRequest, cancel: CancellationToken) {
    let started = Instant::now();
    let sink = state.jobs.sink(&request.id);

    let result = state
        .runner
        .run_personalized(&request, &sink, &cancel)
        .await
        .map(|envelope| serde_json::to_value(&envelope));

    match result {
        Ok(Ok(value)) => {
            state
                .jobs
                .complete(&request.id, "Personalized prediction complete!", value)
                .await;
            metrics::record_completed(JobKind::Prediction, started.elapsed());
        }
        Ok(Err(e)) => {
            error!(analysis_id = %request.id, error = %e, "Failed to encode prediction");
            state
                .jobs
                .fail(&request.id, format!("Prediction error: {}", e))
                .await;
            metrics::record_failed(JobKind::Prediction);
        }
        Err(e) if e.is_cancelled() => {
            warn!(analysis_id = %request.id, "Prediction cancelled");
            state.jobs.mark_cancelled(&request.id).await;
            metrics::record_cancelled(JobKind::Prediction);
        }
        Err(e) => {
            error!(analysis_id = %request.id, error = %e, "Prediction failed");
            state
                .jobs
                .fail(&request.id, format!("Prediction error: {}", e))
                .await;
            metrics::record_failed(JobKind::Prediction);
        }
    }
}
