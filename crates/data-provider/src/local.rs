//! Granules from a local directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use field_pipeline::Dataset;
use geo_common::{BoundingBox, DateRange};
use netcdf_parser::NetcdfDataset;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ProviderError, Result};
use crate::provider::DataProvider;

/// File extensions recognized as NetCDF granules.
const EXTENSIONS: [&str; 3] = [".nc", ".nc4", ".nc4.nc"];

/// Serves granules stored under a directory tree.
///
/// A file matches a collection when its name contains the short name (as
/// with files fetched by [`crate::EarthdataProvider`]) or the MERRA-2 product
/// token for that collection. When the file name carries a `YYYYMMDD` date
/// it must fall inside the requested range.
#[derive(Debug, Clone)]
pub struct LocalDirectoryProvider {
    root: PathBuf,
    max_depth: usize,
}

impl LocalDirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: 4,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Matching granules sorted by file name.
    pub fn find_granules(&self, short_name: &str, dates: &DateRange) -> Vec<PathBuf> {
        let tokens = name_tokens(short_name);
        let mut matches: Vec<PathBuf> = WalkDir::new(&self.root)
            .max_depth(self.max_depth)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy();
                is_granule(&name)
                    && tokens.iter().any(|t| name.contains(t.as_str()))
                    && date_in_name(&name).map_or(true, |d| dates.contains(d))
            })
            .map(|entry| entry.into_path())
            .collect();

        matches.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        matches
    }
}

#[async_trait]
impl DataProvider for LocalDirectoryProvider {
    async fn open(
        &self,
        short_name: &str,
        dates: &DateRange,
        _bbox: &BoundingBox,
    ) -> Result<Option<Box<dyn Dataset>>> {
        if !self.root.is_dir() {
            return Err(ProviderError::Config(format!(
                "data directory {} does not exist",
                self.root.display()
            )));
        }

        let Some(path) = self.find_granules(short_name, dates).into_iter().next() else {
            debug!(short_name = short_name, root = %self.root.display(), "No local granule");
            return Ok(None);
        };

        let dataset = tokio::task::spawn_blocking(move || NetcdfDataset::open(path))
            .await
            .map_err(|e| ProviderError::Task(e.to_string()))??;
        Ok(Some(Box::new(dataset)))
    }

    fn describe(&self) -> String {
        format!("local:{}", self.root.display())
    }
}

fn is_granule(name: &str) -> bool {
    EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Strings identifying a collection in file names.
///
/// GES DISC names files by product (`tavg1_2d_slv_Nx`) rather than by
/// short name, so both are accepted.
fn name_tokens(short_name: &str) -> Vec<String> {
    let mut tokens = vec![short_name.to_string()];
    let product = match short_name {
        "M2T1NXSLV" => Some("tavg1_2d_slv_Nx"),
        "M2T1NXFLX" => Some("tavg1_2d_flx_Nx"),
        "M2T1NXLND" => Some("tavg1_2d_lnd_Nx"),
        "M2T1NXAER" => Some("tavg1_2d_aer_Nx"),
        _ => None,
    };
    tokens.extend(product.map(str::to_string));
    tokens
}

/// First run of exactly eight digits that parses as `YYYYMMDD`.
pub(crate) fn date_in_name(name: &str) -> Option<NaiveDate> {
    let bytes = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 8 {
                if let Ok(date) = NaiveDate::parse_from_str(&name[start..i], "%Y%m%d") {
                    return Some(date);
                }
            }
        } else {
            i += 1;
        }
    }
    None
}
