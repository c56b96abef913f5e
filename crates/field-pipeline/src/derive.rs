//! Derived indicators: unit conversions, wind speed and the drought index.
//!
//! The drought index is a *relative* anomaly within one request: min-max
//! bounds come from the scored region itself, so values are not comparable
//! across requests with different regions or dates.

use geo_common::BoundingBox;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::extract::ExtractedVariables;
use crate::field::{nan_mean, GriddedField, SpatialField};
use crate::subset::subset;

/// Kelvin to Celsius offset.
pub const KELVIN_OFFSET: f64 = 273.15;

/// kg m⁻² s⁻¹ to mm/day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Guard against division by zero in ratios and normalization.
pub const EPSILON: f64 = 1e-9;

/// Upper clip bound of the raw deficit ratio.
pub const DEFICIT_CLIP_MAX: f64 = 2.0;

/// Which input the drought index was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroughtStrategy {
    SoilMoisture,
    Precipitation,
    #[serde(rename = "none")]
    Absent,
}

impl DroughtStrategy {
    /// Soil moisture wins over precipitation; neither gives `Absent`.
    pub fn select(has_soil_moisture: bool, has_precipitation: bool) -> Self {
        if has_soil_moisture {
            DroughtStrategy::SoilMoisture
        } else if has_precipitation {
            DroughtStrategy::Precipitation
        } else {
            DroughtStrategy::Absent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DroughtStrategy::SoilMoisture => "soil_moisture",
            DroughtStrategy::Precipitation => "precipitation",
            DroughtStrategy::Absent => "none",
        }
    }
}

/// Output of [`derive`]. Every field shares the temperature grid only when
/// the source collections share it; no regridding happens here.
#[derive(Debug, Clone)]
pub struct ProcessedFields {
    pub temperature_c: SpatialField,
    pub precipitation_mm_day: Option<SpatialField>,
    pub u_wind: Option<SpatialField>,
    pub v_wind: Option<SpatialField>,
    pub wind_speed: Option<SpatialField>,
    pub soil_moisture: Option<SpatialField>,
    pub drought_index: SpatialField,
    pub drought_strategy: DroughtStrategy,
    pub aerosol: Option<SpatialField>,
}

/// Subset every extracted variable and compute the derived indicators.
pub fn derive(
    extracted: &ExtractedVariables,
    bbox: &BoundingBox,
    time_index: usize,
) -> Result<ProcessedFields> {
    let cut = |field: &Option<GriddedField>| optional_subset(field.as_ref(), time_index, bbox);

    let temperature_k = subset(&extracted.temperature, time_index, bbox)?;
    let precip_rate = cut(&extracted.precipitation)?;
    let u_wind = cut(&extracted.u_wind)?;
    let v_wind = cut(&extracted.v_wind)?;
    let soil_moisture = cut(&extracted.soil_moisture)?;
    let aerosol = cut(&extracted.aerosol)?;

    let temperature_c = kelvin_to_celsius(&temperature_k);

    let wind_speed = match (&u_wind, &v_wind) {
        (Some(u), Some(v)) => Some(wind_speed(u, v)?),
        _ => None,
    };

    let precipitation_mm_day = precip_rate.as_ref().map(rate_to_mm_per_day);

    let drought_strategy =
        DroughtStrategy::select(soil_moisture.is_some(), precip_rate.is_some());
    let drought_index = match (drought_strategy, &soil_moisture, &precip_rate) {
        (DroughtStrategy::SoilMoisture, Some(sm), _) => deficit_index(sm),
        (DroughtStrategy::Precipitation, _, Some(p)) => deficit_index(p),
        _ => temperature_c.map("drought_index", None, |_| 0.0),
    };
    debug!(
        strategy = drought_strategy.as_str(),
        rows = drought_index.dim().0,
        cols = drought_index.dim().1,
        "Computed drought index"
    );

    Ok(ProcessedFields {
        temperature_c,
        precipitation_mm_day,
        u_wind,
        v_wind,
        wind_speed,
        soil_moisture,
        drought_index,
        drought_strategy,
        aerosol,
    })
}

/// Subset an optional variable.
///
/// A grid with no points inside `bbox` makes the quantity unavailable
/// instead of failing the run; only temperature is required to overlap.
fn optional_subset(
    field: Option<&GriddedField>,
    time_index: usize,
    bbox: &BoundingBox,
) -> Result<Option<SpatialField>> {
    let Some(field) = field else {
        return Ok(None);
    };
    match subset(field, time_index, bbox) {
        Ok(cut) => Ok(Some(cut)),
        Err(PipelineError::EmptySubset { variable, .. }) => {
            warn!(variable = %variable, bbox = %bbox, "Optional variable outside region, skipping");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// K → °C.
pub fn kelvin_to_celsius(field: &SpatialField) -> SpatialField {
    field.map("temperature", Some("degC"), |k| k - KELVIN_OFFSET)
}

/// kg m⁻² s⁻¹ → mm/day.
pub fn rate_to_mm_per_day(field: &SpatialField) -> SpatialField {
    field.map("precipitation", Some("mm/day"), |p| p * SECONDS_PER_DAY)
}

/// Per-cell magnitude of the wind vector.
pub fn wind_speed(u: &SpatialField, v: &SpatialField) -> Result<SpatialField> {
    u.zip_with(v, "wind_speed", Some("m/s"), |a, b| (a * a + b * b).sqrt())
}

/// Normalized deficit of a field relative to its own spatial mean.
///
/// `raw = clip(1 - x / (mean + ε), 0, 2)`, then min-max normalized into
/// [0, 1]. NaN cells stay NaN.
pub fn deficit_index(field: &SpatialField) -> SpatialField {
    let climatology = nan_mean(&field.values).unwrap_or(f64::NAN);
    let raw = field
        .values
        .mapv(|x| (1.0 - x / (climatology + EPSILON)).clamp(0.0, DEFICIT_CLIP_MAX));
    field.with_values("drought_index", None, min_max_normalize(&raw))
}

/// `(x - min) / (max - min + ε)` over the non-NaN cells.
pub fn min_max_normalize(values: &Array2<f64>) -> Array2<f64> {
    let finite = values.iter().copied().filter(|v| !v.is_nan());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        return values.clone();
    }
    let span = max - min + EPSILON;
    values.mapv(|x| (x - min) / span)
}
