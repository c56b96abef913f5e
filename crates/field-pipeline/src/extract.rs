//! Variable extraction from a dataset bundle.
//!
//! Each physical quantity has an ordered list of candidate variable names
//! tried against one category of the bundle. The first present name wins.
//! Only temperature is mandatory.

use geo_common::DatasetCategory;
use tracing::debug;

use crate::dataset::DatasetBundle;
use crate::error::{PipelineError, Result};
use crate::field::GriddedField;

/// Number of available variable names reported when temperature is missing.
pub const AVAILABLE_NAMES_LIMIT: usize = 20;

/// Physical quantities the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Temperature,
    Precipitation,
    UWind,
    VWind,
    SoilMoisture,
    Aerosol,
}

impl Quantity {
    pub const ALL: [Quantity; 6] = [
        Quantity::Temperature,
        Quantity::Precipitation,
        Quantity::UWind,
        Quantity::VWind,
        Quantity::SoilMoisture,
        Quantity::Aerosol,
    ];

    /// Candidate names in priority order.
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            Quantity::Temperature => &["T2M", "TMP2m", "TEMP_2M", "T2MDEW", "T10M"],
            Quantity::Precipitation => &["PRECTOT", "PRECTOTCORR", "PRATE", "PRECIP", "PRECC"],
            Quantity::UWind => &["U10M", "U2M", "U_10M", "U10", "U10M_AV"],
            Quantity::VWind => &["V10M", "V2M", "V_10M", "V10", "V10M_AV"],
            Quantity::SoilMoisture => &["GWETROOT", "GWETPROF", "GWETTOP", "SOILM", "SMROOT"],
            Quantity::Aerosol => &["TOTEXTTAU", "AOD", "AOD550", "DUEXTTAU", "DUCMASS"],
        }
    }

    /// Bundle category the candidates are looked up in.
    pub fn category(&self) -> DatasetCategory {
        match self {
            Quantity::Temperature | Quantity::UWind | Quantity::VWind => {
                DatasetCategory::Atmospheric
            }
            Quantity::Precipitation => DatasetCategory::Flux,
            Quantity::SoilMoisture => DatasetCategory::Land,
            Quantity::Aerosol => DatasetCategory::Aerosol,
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Quantity::Temperature)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quantity::Temperature => "temperature",
            Quantity::Precipitation => "precipitation",
            Quantity::UWind => "u_wind",
            Quantity::VWind => "v_wind",
            Quantity::SoilMoisture => "soil_moisture",
            Quantity::Aerosol => "aerosol",
        }
    }
}

/// Raw variables pulled out of a bundle.
#[derive(Debug, Clone)]
pub struct ExtractedVariables {
    pub temperature: GriddedField,
    pub precipitation: Option<GriddedField>,
    pub u_wind: Option<GriddedField>,
    pub v_wind: Option<GriddedField>,
    pub soil_moisture: Option<GriddedField>,
    pub aerosol: Option<GriddedField>,
}

/// First candidate name of `quantity` present in the bundle, if any.
pub fn resolve_name(bundle: &DatasetBundle, quantity: Quantity) -> Option<&'static str> {
    let dataset = bundle.get(quantity.category())?;
    quantity
        .candidates()
        .iter()
        .copied()
        .find(|name| dataset.has(name))
}

/// Read the first matching candidate of `quantity`.
///
/// Returns `Ok(None)` when the category is absent or no candidate matches.
pub fn find_variable(bundle: &DatasetBundle, quantity: Quantity) -> Result<Option<GriddedField>> {
    let Some(name) = resolve_name(bundle, quantity) else {
        debug!(quantity = quantity.as_str(), "No candidate variable found");
        return Ok(None);
    };
    let Some(dataset) = bundle.get(quantity.category()) else {
        return Ok(None);
    };
    debug!(quantity = quantity.as_str(), variable = name, "Resolved variable");
    dataset.get(name).map(Some)
}

/// Extract every quantity, failing if temperature is absent.
pub fn extract(bundle: &DatasetBundle) -> Result<ExtractedVariables> {
    let temperature = match find_variable(bundle, Quantity::Temperature)? {
        Some(field) => field,
        None => return Err(missing_required(bundle, Quantity::Temperature)),
    };

    Ok(ExtractedVariables {
        temperature,
        precipitation: find_variable(bundle, Quantity::Precipitation)?,
        u_wind: find_variable(bundle, Quantity::UWind)?,
        v_wind: find_variable(bundle, Quantity::VWind)?,
        soil_moisture: find_variable(bundle, Quantity::SoilMoisture)?,
        aerosol: find_variable(bundle, Quantity::Aerosol)?,
    })
}

fn missing_required(bundle: &DatasetBundle, quantity: Quantity) -> PipelineError {
    let available = bundle
        .get(quantity.category())
        .map(|d| {
            d.variable_names()
                .into_iter()
                .take(AVAILABLE_NAMES_LIMIT)
                .collect()
        })
        .unwrap_or_default();

    PipelineError::MissingRequiredVariable {
        quantity: quantity.as_str().to_string(),
        candidates: quantity.candidates().iter().map(|s| s.to_string()).collect(),
        available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_order_is_fixed() {
        assert_eq!(Quantity::Temperature.candidates()[0], "T2M");
        assert_eq!(Quantity::SoilMoisture.candidates()[0], "GWETROOT");
        assert_eq!(Quantity::Precipitation.candidates().len(), 5);
    }

    #[test]
    fn test_categories() {
        assert_eq!(Quantity::UWind.category(), DatasetCategory::Atmospheric);
        assert_eq!(Quantity::Precipitation.category(), DatasetCategory::Flux);
        assert_eq!(Quantity::SoilMoisture.category(), DatasetCategory::Land);
        assert_eq!(Quantity::Aerosol.category(), DatasetCategory::Aerosol);
    }

    #[test]
    fn test_empty_bundle_missing_temperature() {
        let err = extract(&DatasetBundle::new()).unwrap_err();
        match err {
            PipelineError::MissingRequiredVariable {
                candidates,
                available,
                ..
            } => {
                assert_eq!(candidates.len(), 5);
                assert!(available.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
