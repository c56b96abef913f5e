//! Analysis API Service Library
//!
//! HTTP job service over [`analysis_runner`]: clients start an analysis or a
//! personalized prediction, poll its progress by id, and fetch the produced
//! maps and JSON files.

pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod state;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::{Extension, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::{AppState, FILES_PREFIX};

/// All routes with their middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let files = ServeDir::new(&state.output_dir);

    Router::new()
        // Jobs
        .route("/api/status", get(handlers::health::status_handler))
        .route("/api/analyze", post(handlers::analysis::analyze_handler))
        .route("/api/progress/:id", get(handlers::analysis::progress_handler))
        .route("/api/analysis/:id", delete(handlers::analysis::cancel_handler))
        .route(
            "/api/personalized-prediction",
            post(handlers::prediction::personalized_handler),
        )
        .route(
            "/api/prediction-progress/:id",
            get(handlers::analysis::progress_handler),
        )
        // Results
        .route("/api/history", get(handlers::history::history_handler))
        .nest_service(FILES_PREFIX, files)
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
