//! Dataset abstraction and category bundles.

use std::collections::BTreeMap;

use geo_common::DatasetCategory;

use crate::error::{PipelineError, Result};
use crate::field::GriddedField;

/// A container of named gridded variables.
///
/// Implementations may be backed by memory or by files; `get` is allowed to
/// perform I/O and fail.
pub trait Dataset: Send + Sync {
    /// Whether a variable with this exact name exists.
    fn has(&self, name: &str) -> bool;

    /// Read a variable.
    fn get(&self, name: &str) -> Result<GriddedField>;

    /// All variable names, in dataset order.
    fn variable_names(&self) -> Vec<String>;
}

/// In-memory dataset, used by tests and synthetic inputs.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    variables: Vec<GriddedField>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable, replacing any variable of the same name.
    pub fn with_field(mut self, field: GriddedField) -> Self {
        self.insert(field);
        self
    }

    pub fn insert(&mut self, field: GriddedField) {
        match self.variables.iter_mut().find(|f| f.name() == field.name()) {
            Some(existing) => *existing = field,
            None => self.variables.push(field),
        }
    }
}

impl Dataset for MemoryDataset {
    fn has(&self, name: &str) -> bool {
        self.variables.iter().any(|f| f.name() == name)
    }

    fn get(&self, name: &str) -> Result<GriddedField> {
        self.variables
            .iter()
            .find(|f| f.name() == name)
            .cloned()
            .ok_or_else(|| PipelineError::dataset(name, "no such variable"))
    }

    fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|f| f.name().to_string()).collect()
    }
}

/// Datasets keyed by thematic category. Absent categories are simply missing.
#[derive(Default)]
pub struct DatasetBundle {
    datasets: BTreeMap<DatasetCategory, Box<dyn Dataset>>,
}

impl DatasetBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: DatasetCategory, dataset: impl Dataset + 'static) -> Self {
        self.insert(category, Box::new(dataset));
        self
    }

    pub fn insert(&mut self, category: DatasetCategory, dataset: Box<dyn Dataset>) {
        self.datasets.insert(category, dataset);
    }

    pub fn get(&self, category: DatasetCategory) -> Option<&dyn Dataset> {
        self.datasets.get(&category).map(|d| d.as_ref())
    }

    pub fn categories(&self) -> Vec<DatasetCategory> {
        self.datasets.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl std::fmt::Debug for DatasetBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetBundle")
            .field("categories", &self.categories())
            .finish()
    }
}
