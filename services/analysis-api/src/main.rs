//! Analysis API Server
//!
//! Runs reanalysis analyses as background jobs and serves their progress,
//! results and images over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use analysis_runner::AnalysisConfig;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use analysis_api::state::AppState;

/// How often finished jobs are checked against the retention period.
const JOB_EVICTION_INTERVAL: Duration = Duration::from_secs(60);

/// Analysis API Server
#[derive(Parser, Debug)]
#[command(name = "analysis-api")]
#[command(about = "HTTP job service for reanalysis weather and drought analyses")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:5000", env = "ANALYSIS_LISTEN_ADDR")]
    listen: String,

    /// Analysis configuration file (YAML)
    #[arg(short, long, default_value = "config/analysis.yaml", env = "ANALYSIS_CONFIG")]
    config: PathBuf,

    /// Output directory for maps and results
    #[arg(long, env = "ANALYSIS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Read granules from this directory instead of NASA Earthdata
    #[arg(long, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Seconds a finished job stays pollable
    #[arg(long, default_value = "3600", env = "ANALYSIS_JOB_RETENTION_SECS")]
    job_retention_secs: u64,

    /// Number of worker threads
    #[arg(long, env = "ANALYSIS_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;
    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    let mut config = AnalysisConfig::load_or_default(Some(&args.config))?;
    config.apply_env();
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(dir) = args.data_dir {
        config.data_source = analysis_runner::DataSourceConfig::Local { data_dir: dir };
    }
    config.validate()?;

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {:?}", config.output_dir)
    })?;

    let state = Arc::new(AppState::from_config(&config)?.with_prometheus(prometheus_handle));
    state.jobs.spawn_eviction(
        Duration::from_secs(args.job_retention_secs),
        JOB_EVICTION_INTERVAL,
    );
    let app = analysis_api::router(state);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address {}", args.listen))?;
    info!(address = %addr, "Analysis API listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
