//! Provider trait and bundle assembly.

use async_trait::async_trait;
use field_pipeline::{Dataset, DatasetBundle};
use geo_common::{BoundingBox, DateRange, DatasetCategory};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ProviderError, Result};

/// Source of gridded datasets.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Open the first dataset of `short_name` matching the dates and region.
    ///
    /// `Ok(None)` means the search found nothing.
    async fn open(
        &self,
        short_name: &str,
        dates: &DateRange,
        bbox: &BoundingBox,
    ) -> Result<Option<Box<dyn Dataset>>>;

    /// Short description for logs and status endpoints.
    fn describe(&self) -> String;
}

/// Collection short names per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetNames {
    pub atmospheric: String,
    pub flux: String,
    pub land: String,
    pub aerosol: String,
}

impl Default for DatasetNames {
    fn default() -> Self {
        Self {
            atmospheric: DatasetCategory::Atmospheric.default_short_name().to_string(),
            flux: DatasetCategory::Flux.default_short_name().to_string(),
            land: DatasetCategory::Land.default_short_name().to_string(),
            aerosol: DatasetCategory::Aerosol.default_short_name().to_string(),
        }
    }
}

impl DatasetNames {
    pub fn for_category(&self, category: DatasetCategory) -> &str {
        match category {
            DatasetCategory::Atmospheric => &self.atmospheric,
            DatasetCategory::Flux => &self.flux,
            DatasetCategory::Land => &self.land,
            DatasetCategory::Aerosol => &self.aerosol,
        }
    }
}

/// Open all four collections.
///
/// The atmospheric collection must be found; a miss fails with
/// [`ProviderError::NoResults`] and an error is propagated. Misses and errors
/// for the optional collections are logged and leave the category empty.
pub async fn fetch_bundle(
    provider: &dyn DataProvider,
    dates: &DateRange,
    bbox: &BoundingBox,
    names: &DatasetNames,
) -> Result<DatasetBundle> {
    let mut bundle = DatasetBundle::new();

    for category in DatasetCategory::ALL {
        let short_name = names.for_category(category);
        info!(
            category = %category,
            short_name = short_name,
            dates = %dates,
            bbox = %bbox,
            "Searching dataset"
        );

        match provider.open(short_name, dates, bbox).await {
            Ok(Some(dataset)) => {
                let preview: Vec<String> = dataset.variable_names().into_iter().take(10).collect();
                info!(
                    category = %category,
                    short_name = short_name,
                    variables = ?preview,
                    "Opened dataset"
                );
                bundle.insert(category, dataset);
            }
            Ok(None) if category.is_required() => {
                return Err(ProviderError::NoResults {
                    short_name: short_name.to_string(),
                    dates: dates.to_string(),
                    bbox: bbox.to_string(),
                });
            }
            Ok(None) => {
                warn!(category = %category, short_name = short_name, "No results, continuing without it");
            }
            Err(e) if category.is_required() => return Err(e),
            Err(e) => {
                warn!(
                    category = %category,
                    short_name = short_name,
                    error = %e,
                    "Optional dataset unavailable, continuing without it"
                );
            }
        }
    }

    Ok(bundle)
}
