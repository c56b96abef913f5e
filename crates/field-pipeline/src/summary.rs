//! Scalar summary of a processed field set.

use geo_common::{BoundingBox, DateRange};
use serde::{Deserialize, Serialize};

use crate::derive::{DroughtStrategy, ProcessedFields};
use crate::field::SpatialField;

/// Flat record of spatial means plus request metadata.
///
/// Every numeric value is finite or `null`; an absent source field and a field
/// with no valid cells both serialize as `null` with the key kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub bbox: BoundingBox,
    pub dates: DateRange,
    pub precip_mean_mm_per_day: Option<f64>,
    #[serde(rename = "temp_mean_C")]
    pub temp_mean_c: Option<f64>,
    pub wind_mean_m_s: Option<f64>,
    pub drought_index_mean: Option<f64>,
    pub aod_mean: Option<f64>,
    #[serde(default = "default_source")]
    pub drought_index_source: DroughtStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_plot_path: Option<String>,
}

fn default_source() -> DroughtStrategy {
    DroughtStrategy::Absent
}

/// Reduce each processed field to its NaN-aware spatial mean.
pub fn summarize(processed: &ProcessedFields, dates: DateRange, bbox: BoundingBox) -> SummaryRecord {
    let mean = |field: Option<&SpatialField>| field.and_then(SpatialField::nan_mean);

    SummaryRecord {
        bbox,
        dates,
        precip_mean_mm_per_day: mean(processed.precipitation_mm_day.as_ref()),
        temp_mean_c: mean(Some(&processed.temperature_c)),
        wind_mean_m_s: mean(processed.wind_speed.as_ref()),
        drought_index_mean: mean(Some(&processed.drought_index)),
        aod_mean: mean(processed.aerosol.as_ref()),
        drought_index_source: processed.drought_strategy,
        map_path: None,
        quick_plot_path: None,
    }
}

impl SummaryRecord {
    /// Pretty JSON, as persisted and sent to the advisory service.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
