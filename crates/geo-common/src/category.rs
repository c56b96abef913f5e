//! Thematic dataset categories of the MERRA-2 hourly 2-D collections.

use serde::{Deserialize, Serialize};

/// One of the four collections that make up a dataset bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetCategory {
    /// Single-level diagnostics: temperature, wind. Required.
    Atmospheric,
    /// Surface fluxes: precipitation.
    Flux,
    /// Land surface: soil wetness.
    Land,
    /// Aerosol diagnostics: optical depth.
    Aerosol,
}

impl DatasetCategory {
    pub const ALL: [DatasetCategory; 4] = [
        DatasetCategory::Atmospheric,
        DatasetCategory::Flux,
        DatasetCategory::Land,
        DatasetCategory::Aerosol,
    ];

    /// Default MERRA-2 collection short name.
    pub fn default_short_name(&self) -> &'static str {
        match self {
            DatasetCategory::Atmospheric => "M2T1NXSLV",
            DatasetCategory::Flux => "M2T1NXFLX",
            DatasetCategory::Land => "M2T1NXLND",
            DatasetCategory::Aerosol => "M2T1NXAER",
        }
    }

    /// Whether an analysis can proceed without this category.
    pub fn is_required(&self) -> bool {
        matches!(self, DatasetCategory::Atmospheric)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetCategory::Atmospheric => "atmospheric",
            DatasetCategory::Flux => "flux",
            DatasetCategory::Land => "land",
            DatasetCategory::Aerosol => "aerosol",
        }
    }
}

impl std::fmt::Display for DatasetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
