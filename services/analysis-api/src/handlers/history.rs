//! Listing of persisted analyses.

use std::sync::Arc;

use analysis_runner::{list_history, HistoryEntry};
use axum::extract::Extension;
use axum::Json;
use geo_common::ServiceError;
use serde::Serialize;
use tracing::error;

use crate::error::ApiResult;
use crate::state::{AppState, FILES_PREFIX};

#[derive(Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub files: Vec<HistoryEntry>,
}

/// GET /api/history
pub async fn history_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<HistoryResponse>> {
    let dir = state.output_dir.clone();
    let files = tokio::task::spawn_blocking(move || list_history(&dir, FILES_PREFIX))
        .await
        .map_err(|e| ServiceError::InternalError(e.to_string()))?
        .map_err(|e| {
            error!(error = %e, "Failed to list history");
            ServiceError::InternalError(format!("History listing error: {}", e))
        })?;

    Ok(Json(HistoryResponse {
        success: true,
        files,
    }))
}
