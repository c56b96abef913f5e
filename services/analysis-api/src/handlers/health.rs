//! Health, status and metrics handlers.

use std::sync::Arc;

use axum::extract::Extension;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Local;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "analysis-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub data_source: String,
    pub ai_configured: bool,
    pub timestamp: String,
}

/// GET /api/status
pub async fn status_handler(Extension(state): Extension<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "online",
        data_source: state.data_source.clone(),
        ai_configured: state.runner.advisory().is_configured(),
        timestamp: Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
    })
}

/// GET /metrics - Prometheus text format
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let body = state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}
