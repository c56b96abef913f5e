//! Analysis configuration.
//!
//! Loaded from an optional YAML file with `${VAR}` / `${VAR:-default}`
//! substitution, then overridden from the environment and finally by
//! command-line flags in the binaries.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use advisory::{Advisory, GeminiClient, GeminiConfig, DEFAULT_MODEL};
use anyhow::{Context, Result};
use data_provider::{DataProvider, DatasetNames, EarthdataConfig, EarthdataProvider, LocalDirectoryProvider};
use geo_common::{BoundingBox, DateRange};
use renderer::PngRenderer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ============================================================================
// Config structures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Region used when a request does not carry one
    pub bbox: BoundingBox,
    /// Period used when a request does not carry one
    pub dates: DateRange,
    /// Time step read from each dataset
    pub time_index: usize,
    /// Where maps and JSON results are written
    pub output_dir: PathBuf,
    pub datasets: DatasetNames,
    pub data_source: DataSourceConfig,
    pub advisory: AdvisorySettings,
    pub render: RenderSettings,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bbox: BoundingBox::DEFAULT,
            dates: DateRange::default_period(),
            time_index: 0,
            output_dir: PathBuf::from("output"),
            datasets: DatasetNames::default(),
            data_source: DataSourceConfig::default(),
            advisory: AdvisorySettings::default(),
            render: RenderSettings::default(),
        }
    }
}

/// Where granules come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataSourceConfig {
    /// Granules already on disk
    Local { data_dir: PathBuf },
    /// NASA CMR search with a local download cache
    Earthdata {
        #[serde(default = "default_cmr_url")]
        cmr_url: String,
        #[serde(default = "default_cache_dir")]
        cache_dir: PathBuf,
        #[serde(default)]
        token: Option<String>,
        #[serde(default = "default_max_retries")]
        max_retries: u32,
        #[serde(default = "default_request_timeout_secs")]
        request_timeout_secs: u64,
    },
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        DataSourceConfig::Earthdata {
            cmr_url: default_cmr_url(),
            cache_dir: default_cache_dir(),
            token: None,
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl DataSourceConfig {
    /// Short label for status responses.
    pub fn label(&self) -> &'static str {
        match self {
            DataSourceConfig::Local { .. } => "Local MERRA-2 granules",
            DataSourceConfig::Earthdata { .. } => "NASA MERRA-2",
        }
    }
}

fn default_cmr_url() -> String {
    data_provider::earthdata::DEFAULT_CMR_URL.to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data/cache")
}

fn default_max_retries() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    600
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorySettings {
    pub model: String,
    pub thinking_budget: u32,
    pub request_timeout_secs: u64,
}

impl Default for AdvisorySettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            thinking_budget: 0,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Pixels per grid cell edge
    pub cell_pixels: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            cell_pixels: PngRenderer::DEFAULT_CELL_PIXELS,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl AnalysisConfig {
    /// Load a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read analysis config from {:?}", path))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse analysis config from {:?}", path))?;
        info!(path = %path.display(), "Loaded analysis config");
        Ok(config)
    }

    /// Parse YAML text after environment substitution.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: Self = serde_yaml::from_str(&expanded).context("Invalid analysis config YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) if p.as_ref().exists() => Self::load(p),
            Some(p) => {
                debug!(path = %p.as_ref().display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply `ANALYSIS_OUTPUT_DIR`, `DATA_DIR`, `EARTHDATA_TOKEN` and `GEMINI_MODEL`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()));
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("ANALYSIS_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("DATA_DIR") {
            self.data_source = DataSourceConfig::Local {
                data_dir: PathBuf::from(dir),
            };
        }
        if let Some(value) = lookup("EARTHDATA_TOKEN") {
            if let DataSourceConfig::Earthdata { token, .. } = &mut self.data_source {
                *token = Some(value);
            }
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.advisory.model = model;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bbox
            .validate()
            .with_context(|| format!("Invalid default region {}", self.bbox))?;
        anyhow::ensure!(
            !self.output_dir.as_os_str().is_empty(),
            "Output directory cannot be empty"
        );
        anyhow::ensure!(
            !self.datasets.atmospheric.trim().is_empty(),
            "Atmospheric dataset short name cannot be empty"
        );
        anyhow::ensure!(self.render.cell_pixels > 0, "Cell size must be at least one pixel");
        match &self.data_source {
            DataSourceConfig::Local { data_dir } => anyhow::ensure!(
                !data_dir.as_os_str().is_empty(),
                "Local data directory cannot be empty"
            ),
            DataSourceConfig::Earthdata { cmr_url, .. } => anyhow::ensure!(
                cmr_url.starts_with("http://") || cmr_url.starts_with("https://"),
                "CMR URL must be http(s): {}",
                cmr_url
            ),
        }
        Ok(())
    }

    // ========================================================================
    // Collaborators
    // ========================================================================

    pub fn build_provider(&self) -> Result<Arc<dyn DataProvider>> {
        let provider: Arc<dyn DataProvider> = match &self.data_source {
            DataSourceConfig::Local { data_dir } => Arc::new(LocalDirectoryProvider::new(data_dir)),
            DataSourceConfig::Earthdata {
                cmr_url,
                cache_dir,
                token,
                max_retries,
                request_timeout_secs,
            } => {
                let config = EarthdataConfig {
                    cmr_url: cmr_url.clone(),
                    token: token.clone(),
                    cache_dir: cache_dir.clone(),
                    max_retries: *max_retries,
                    request_timeout: Duration::from_secs(*request_timeout_secs),
                    ..EarthdataConfig::default()
                };
                Arc::new(EarthdataProvider::new(config).context("Failed to create Earthdata client")?)
            }
        };
        Ok(provider)
    }

    pub fn build_renderer(&self) -> PngRenderer {
        PngRenderer::new(&self.output_dir).with_cell_pixels(self.render.cell_pixels)
    }

    /// Gemini client; the API key comes from `GEMINI_API_KEY`.
    pub fn build_advisory(&self) -> Result<Arc<dyn Advisory>> {
        let config = GeminiConfig {
            model: self.advisory.model.clone(),
            thinking_budget: self.advisory.thinking_budget,
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            request_timeout: Duration::from_secs(self.advisory.request_timeout_secs),
            ..GeminiConfig::default()
        };
        let client = GeminiClient::new(config).context("Failed to create Gemini client")?;
        Ok(Arc::new(client))
    }
}

// ============================================================================
// Environment variable substitution
// ============================================================================

/// Expand `${VAR}` and `${VAR:-default}` references.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .with_context(|| format!("Unclosed variable substitution: ${{{}", after))?;
        result.push_str(&resolve_var_expr(&after[..end])?);
        rest = &after[end + 1..];
    }
    result.push_str(rest);

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((name, default)) = expr.split_once(":-") {
        match std::env::var(name.trim()) {
            Ok(value) if !value.is_empty() => Ok(value),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}
