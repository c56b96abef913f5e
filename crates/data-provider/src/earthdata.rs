//! NASA Earthdata provider: CMR granule search plus cached download.
//!
//! Key features:
//! - CMR `granules.json` search by short name, temporal range and bounding box
//! - Bearer token authentication (`EARTHDATA_TOKEN`)
//! - Cache directory: granules already on disk are not downloaded again
//! - Exponential backoff retry on failures
//! - Writes through a `.partial` file and renames on completion

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use field_pipeline::Dataset;
use futures::StreamExt;
use geo_common::{BoundingBox, DateRange};
use netcdf_parser::NetcdfDataset;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::error::{ProviderError, Result};
use crate::provider::DataProvider;

/// Default CMR search endpoint.
pub const DEFAULT_CMR_URL: &str = "https://cmr.earthdata.nasa.gov";

/// Link relation CMR uses for downloadable data.
const DATA_REL_SUFFIX: &str = "/data#";

/// Configuration for the Earthdata provider.
#[derive(Debug, Clone)]
pub struct EarthdataConfig {
    /// CMR base URL
    pub cmr_url: String,
    /// Earthdata Login bearer token
    pub token: Option<String>,
    /// Directory for downloaded granules
    pub cache_dir: PathBuf,
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial retry delay (doubles each retry)
    pub initial_retry_delay: Duration,
    /// Maximum retry delay
    pub max_retry_delay: Duration,
    /// HTTP request timeout
    pub request_timeout: Duration,
}

impl Default for EarthdataConfig {
    fn default() -> Self {
        Self {
            cmr_url: DEFAULT_CMR_URL.to_string(),
            token: None,
            cache_dir: PathBuf::from("data/cache"),
            max_retries: 3,
            initial_retry_delay: Duration::from_secs(2),
            max_retry_delay: Duration::from_secs(60),
            request_timeout: Duration::from_secs(600), // 10 minutes
        }
    }
}

/// CMR search response (only the parts we read).
#[derive(Debug, Deserialize)]
pub struct CmrResponse {
    pub feed: CmrFeed,
}

#[derive(Debug, Deserialize)]
pub struct CmrFeed {
    #[serde(default)]
    pub entry: Vec<CmrGranule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CmrGranule {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub producer_granule_id: Option<String>,
    #[serde(default)]
    pub links: Vec<CmrLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CmrLink {
    pub rel: String,
    pub href: String,
    #[serde(default)]
    pub inherited: bool,
}

impl CmrGranule {
    /// First non-inherited HTTPS data link.
    pub fn data_url(&self) -> Option<&str> {
        self.links
            .iter()
            .filter(|l| !l.inherited && l.rel.ends_with(DATA_REL_SUFFIX))
            .map(|l| l.href.as_str())
            .find(|href| href.starts_with("https://"))
    }

    /// File name to store the granule under.
    pub fn file_name(&self) -> Option<String> {
        if let Some(id) = self.producer_granule_id.as_deref().filter(|s| !s.is_empty()) {
            return Some(id.to_string());
        }
        self.data_url()
            .and_then(|url| url.rsplit('/').next())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Searches CMR and downloads granules into a cache directory.
pub struct EarthdataProvider {
    client: Client,
    config: EarthdataConfig,
}

impl EarthdataProvider {
    pub fn new(config: EarthdataConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, config })
    }

    /// Search CMR for granules, earliest first.
    #[instrument(skip(self), fields(short_name = %short_name))]
    pub async fn search(
        &self,
        short_name: &str,
        dates: &DateRange,
        bbox: &BoundingBox,
    ) -> Result<Vec<CmrGranule>> {
        let url = format!(
            "{}/search/granules.json",
            self.config.cmr_url.trim_end_matches('/')
        );
        let response = self
            .client
            .get(&url)
            .query(&[
                ("short_name", short_name.to_string()),
                ("temporal", dates.to_temporal_query()),
                ("bounding_box", bbox.to_query_string()),
                ("page_size", "10".to_string()),
                ("sort_key", "start_date".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let body: CmrResponse = response.json().await?;
        debug!(granules = body.feed.entry.len(), "CMR search complete");
        Ok(body.feed.entry)
    }

    /// Download a URL into the cache directory, retrying with backoff.
    ///
    /// Returns the cached path immediately if the file already exists.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn download(&self, url: &str, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.config.cache_dir).await?;

        let final_path = self.config.cache_dir.join(file_name);
        if final_path.exists() {
            info!(path = %final_path.display(), "Granule already cached, skipping download");
            return Ok(final_path);
        }
        let temp_path = self.config.cache_dir.join(format!("{}.partial", file_name));

        let mut attempt = 0;
        let mut delay = self.config.initial_retry_delay;
        loop {
            attempt += 1;
            match self.fetch_to_file(url, &temp_path).await {
                Ok(bytes) => {
                    fs::rename(&temp_path, &final_path).await?;
                    info!(path = %final_path.display(), bytes = bytes, "Download completed");
                    return Ok(final_path);
                }
                Err(e) => {
                    fs::remove_file(&temp_path).await.ok();
                    if attempt > self.config.max_retries || !is_retryable(&e) {
                        return Err(ProviderError::DownloadFailed {
                            url: url.to_string(),
                            attempts: attempt,
                            message: e.to_string(),
                        });
                    }
                    warn!(
                        error = %e,
                        retry = attempt,
                        max_retries = self.config.max_retries,
                        delay_secs = delay.as_secs(),
                        "Download failed, retrying"
                    );
                    tokio::time::sleep(delay).await;

                    // Exponential backoff
                    delay = std::cmp::min(delay * 2, self.config.max_retry_delay);
                }
            }
        }
    }

    /// Stream one GET response into `path`. Returns the byte count.
    async fn fetch_to_file(&self, url: &str, path: &Path) -> Result<u64> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.config.token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = request.send().await?;

        match response.status() {
            StatusCode::OK => {}
            status => {
                return Err(ProviderError::HttpStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                })
            }
        }

        let mut file = fs::File::create(path).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

/// Client errors other than throttling are not worth retrying.
fn is_retryable(err: &ProviderError) -> bool {
    match err {
        ProviderError::HttpStatus { status, .. } => {
            *status == 429 || !(400..500).contains(status)
        }
        ProviderError::Io(_) | ProviderError::Http(_) => true,
        _ => false,
    }
}

#[async_trait]
impl DataProvider for EarthdataProvider {
    async fn open(
        &self,
        short_name: &str,
        dates: &DateRange,
        bbox: &BoundingBox,
    ) -> Result<Option<Box<dyn Dataset>>> {
        let granules = self.search(short_name, dates, bbox).await?;
        let Some(granule) = granules.iter().find(|g| g.data_url().is_some()) else {
            return Ok(None);
        };

        let (Some(url), Some(file_name)) = (granule.data_url(), granule.file_name()) else {
            return Ok(None);
        };
        info!(short_name = short_name, granule = %granule.title, "Selected granule");

        let path = self.download(url, &file_name).await?;
        let dataset = tokio::task::spawn_blocking(move || NetcdfDataset::open(path))
            .await
            .map_err(|e| ProviderError::Task(e.to_string()))??;
        Ok(Some(Box::new(dataset)))
    }

    fn describe(&self) -> String {
        format!("earthdata:{}", self.config.cmr_url)
    }
}
