//! Reanalysis weather and drought analyzer.
//!
//! Interactive by default: asks for a date range, runs the analysis, prints a
//! quick summary and offers an AI commentary. `--start` and `--end` run
//! without prompts.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use analysis_runner::{
    new_job_id, AnalysisConfig, AnalysisRequest, AnalysisRunner, CancellationToken,
    DataSourceConfig, LogProgress, ANALYSIS_PREFIX,
};
use analyzer::console::{ask, is_yes, quick_summary, read_dates};
use anyhow::{Context, Result};
use clap::Parser;
use geo_common::{BoundingBox, DateRange};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Reanalysis weather and drought analyzer
#[derive(Parser, Debug)]
#[command(name = "analyzer")]
#[command(about = "Analyze MERRA-2 weather and drought conditions for a region and period")]
struct Args {
    /// Start date (YYYY-MM-DD); prompts when omitted
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD); prompts when omitted
    #[arg(long)]
    end: Option<String>,

    /// Run the AI commentary without asking
    #[arg(long)]
    ai: bool,

    /// Region as lon_min,lat_min,lon_max,lat_max
    #[arg(long)]
    bbox: Option<String>,

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
    #[arg(long, default_value = "warn", env = "RUST_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = load_config(&args)?;
    let bbox = match &args.bbox {
        Some(text) => BoundingBox::parse(text).with_context(|| format!("Invalid --bbox {}", text))?,
        None => config.bbox,
    };

    println!("MERRA-2 Weather Analysis");
    println!("{}", "=".repeat(40));

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let interactive = args.start.is_none() || args.end.is_none();
    let dates = match (&args.start, &args.end) {
        (Some(start), Some(end)) => DateRange::parse(start, end).context("Invalid --start/--end")?,
        _ => {
            println!("\nEnter the date range for the analysis:");
            match read_dates(&mut input, &mut output)? {
                Some(dates) => dates,
                None => {
                    println!("\nExiting.");
                    return Ok(());
                }
            }
        }
    };

    let runner = AnalysisRunner::new(
        config.build_provider()?,
        Arc::new(config.build_renderer()),
        config.build_advisory()?,
        &config.output_dir,
    )
    .with_datasets(config.datasets.clone())
    .with_time_index(config.time_index);

    let request = AnalysisRequest {
        id: new_job_id(ANALYSIS_PREFIX),
        dates,
        bbox,
        include_ai: false,
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    println!("\nFetching data for {} ...", dates);
    let progress = LogProgress {
        job_id: request.id.clone(),
    };
    let outcome = match runner.run(&request, &progress, &cancel).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_cancelled() => {
            println!("\nStopped by user.");
            return Ok(());
        }
        Err(e) => {
            eprintln!("\nError: {}", e);
            eprintln!("Check your network connection and NASA Earthdata credentials.");
            return Err(e.into());
        }
    };

    print!("{}", quick_summary(&outcome.summary));

    let run_ai = if args.ai {
        true
    } else if interactive {
        ask(&mut input, &mut output, "\nRun AI analysis? (y/n): ")?
            .map(|answer| is_yes(&answer))
            .unwrap_or(false)
    } else {
        false
    };

    if run_ai {
        if !runner.advisory().is_configured() {
            warn!("GEMINI_API_KEY not set, showing the basic summary");
        }
        println!("Starting AI analysis...");
        let text = runner.advise(&outcome.summary).await;
        println!("{}", text);
    } else {
        println!("Analysis complete!");
    }

    println!("Details saved: {}", outcome.output_path.display());
    info!(analysis_id = %outcome.id, "Done");
    output.flush()?;
    Ok(())
}

fn load_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = AnalysisConfig::load_or_default(Some(&args.config))?;
    config.apply_env();
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(dir) = &args.data_dir {
        config.data_source = DataSourceConfig::Local {
            data_dir: dir.clone(),
        };
    }
    config.validate()?;
    Ok(config)
}
