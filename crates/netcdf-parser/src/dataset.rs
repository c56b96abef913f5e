//! File-backed dataset.

use std::path::{Path, PathBuf};

use field_pipeline::{Dataset, GriddedField, PipelineError};
use tracing::info;

use crate::error::NetCdfResult;
use crate::native::{read_field_with_layout, read_layout, GridLayout};

/// A NetCDF granule exposed through the [`Dataset`] trait.
///
/// The layout is inspected once on open; each `get` reopens the file and
/// reads a single variable.
#[derive(Debug, Clone)]
pub struct NetcdfDataset {
    path: PathBuf,
    layout: GridLayout,
}

impl NetcdfDataset {
    pub fn open<P: AsRef<Path>>(path: P) -> NetCdfResult<Self> {
        let path = path.as_ref().to_path_buf();
        let layout = read_layout(&path)?;
        info!(
            path = %path.display(),
            variables = layout.variables.len(),
            lats = layout.lats.len(),
            lons = layout.lons.len(),
            "Opened NetCDF dataset"
        );
        Ok(Self { path, layout })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }
}

impl Dataset for NetcdfDataset {
    fn has(&self, name: &str) -> bool {
        self.layout.variables.iter().any(|v| v == name)
    }

    fn get(&self, name: &str) -> field_pipeline::Result<GriddedField> {
        read_field_with_layout(&self.path, name, &self.layout)
            .map_err(|e| PipelineError::dataset(name, e))
    }

    fn variable_names(&self) -> Vec<String> {
        self.layout.variables.clone()
    }
}
