//! Common test fixtures for reanalysis analysis tests.
//!
//! This module provides pre-defined regions, grids and dataset bundles that
//! represent common scenarios in the analysis pipeline.

use field_pipeline::{DatasetBundle, GriddedField, MemoryDataset};
use geo_common::DatasetCategory;
use ndarray::Array3;

use crate::generators::*;

/// Common bounding box definitions for testing.
pub mod bbox {
    use geo_common::BoundingBox;

    /// Default analysis region (Türkiye and surroundings).
    pub const DEFAULT: BoundingBox = BoundingBox::DEFAULT;

    /// A small window inside the default region.
    pub const ANKARA: BoundingBox = BoundingBox {
        lon_min: 32.0,
        lat_min: 39.0,
        lon_max: 34.0,
        lat_max: 41.0,
    };

    /// A window that touches no point of the default test grids.
    pub const SOUTH_ATLANTIC: BoundingBox = BoundingBox {
        lon_min: -30.0,
        lat_min: -40.0,
        lon_max: -20.0,
        lat_max: -30.0,
    };
}

/// Common grid specifications for testing.
pub mod grid {
    /// MERRA-2 native global grid (0.625° × 0.5°), longitudes -180..179.375.
    pub const MERRA2_GLOBAL: GridSpec = GridSpec {
        width: 576,
        height: 361,
        min_lon: -180.0,
        max_lon: 179.375,
        min_lat: -90.0,
        max_lat: 90.0,
    };

    /// Regional grid covering and slightly exceeding the default region.
    pub const ANATOLIA: GridSpec = GridSpec {
        width: 25,
        height: 13,
        min_lon: 24.0,
        max_lon: 48.0,
        min_lat: 35.0,
        max_lat: 47.0,
    };

    /// Regional grid with 0..360 longitudes.
    pub const ANATOLIA_0_360: GridSpec = GridSpec {
        width: 9,
        height: 5,
        min_lon: 20.0,
        max_lon: 340.0,
        min_lat: 34.0,
        max_lat: 44.0,
    };

    /// Simple 3x3 grid inside the default region.
    pub const SIMPLE_3X3: GridSpec = GridSpec {
        width: 3,
        height: 3,
        min_lon: 30.0,
        max_lon: 32.0,
        min_lat: 38.0,
        max_lat: 40.0,
    };

    /// Grid specification for testing.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub width: usize,
        pub height: usize,
        pub min_lon: f64,
        pub max_lon: f64,
        pub min_lat: f64,
        pub max_lat: f64,
    }

    impl GridSpec {
        /// Returns the total number of grid cells.
        pub fn size(&self) -> usize {
            self.width * self.height
        }

        /// Cell spacing in degrees `(dlon, dlat)`.
        pub fn resolution(&self) -> (f64, f64) {
            let dx = (self.max_lon - self.min_lon) / (self.width.max(2) - 1) as f64;
            let dy = (self.max_lat - self.min_lat) / (self.height.max(2) - 1) as f64;
            (dx, dy)
        }

        /// Ascending latitude axis.
        pub fn lats(&self) -> Vec<f64> {
            let (_, dy) = self.resolution();
            (0..self.height).map(|i| self.min_lat + i as f64 * dy).collect()
        }

        /// Ascending longitude axis.
        pub fn lons(&self) -> Vec<f64> {
            let (dx, _) = self.resolution();
            (0..self.width).map(|i| self.min_lon + i as f64 * dx).collect()
        }
    }
}

/// Common date strings for testing.
pub mod dates {
    pub const START: &str = "2025-09-01";
    pub const END: &str = "2025-10-02";
}

use grid::GridSpec;

/// Builds a one-step `(time, lat, lon)` field on `spec` from row-major values.
pub fn gridded_field(name: &str, spec: &GridSpec, values: Vec<f64>) -> GriddedField {
    let cube = Array3::from_shape_vec((1, spec.height, spec.width), values)
        .expect("values must match grid size");
    GriddedField::new(name, spec.lats(), spec.lons(), cube).expect("valid synthetic field")
}

/// Builds a multi-step field where step `t` holds `values + t`.
pub fn gridded_series(name: &str, spec: &GridSpec, values: Vec<f64>, steps: usize) -> GriddedField {
    let mut all = Vec::with_capacity(values.len() * steps);
    for t in 0..steps {
        all.extend(values.iter().map(|v| v + t as f64));
    }
    let cube = Array3::from_shape_vec((steps, spec.height, spec.width), all)
        .expect("values must match grid size");
    GriddedField::new(name, spec.lats(), spec.lons(), cube).expect("valid synthetic field")
}

/// Which optional collections a synthetic bundle carries.
#[derive(Debug, Clone, Copy)]
pub struct BundleOptions {
    pub wind: bool,
    pub precipitation: bool,
    pub soil_moisture: bool,
    pub aerosol: bool,
}

impl BundleOptions {
    pub const ALL: BundleOptions = BundleOptions {
        wind: true,
        precipitation: true,
        soil_moisture: true,
        aerosol: true,
    };

    pub const TEMPERATURE_ONLY: BundleOptions = BundleOptions {
        wind: false,
        precipitation: false,
        soil_moisture: false,
        aerosol: false,
    };
}

/// A synthetic bundle with MERRA-2 variable names on `spec`.
pub fn synthetic_bundle(spec: &GridSpec, options: BundleOptions) -> DatasetBundle {
    let (w, h) = (spec.width, spec.height);

    let mut atmospheric = MemoryDataset::new()
        .with_field(gridded_field("T2M", spec, create_temperature_grid(w, h)).with_units("K"))
        .with_field(gridded_field("PS", spec, create_constant_grid(w, h, 101_325.0)));
    if options.wind {
        atmospheric.insert(gridded_field("U10M", spec, create_u_wind_grid(w, h)));
        atmospheric.insert(gridded_field("V10M", spec, create_v_wind_grid(w, h)));
    }

    let mut bundle = DatasetBundle::new().with(DatasetCategory::Atmospheric, atmospheric);

    if options.precipitation {
        bundle = bundle.with(
            DatasetCategory::Flux,
            MemoryDataset::new().with_field(gridded_field(
                "PRECTOT",
                spec,
                create_precipitation_rate_grid(w, h, 7),
            )),
        );
    }
    if options.soil_moisture {
        bundle = bundle.with(
            DatasetCategory::Land,
            MemoryDataset::new().with_field(gridded_field(
                "GWETROOT",
                spec,
                create_soil_moisture_grid(w, h),
            )),
        );
    }
    if options.aerosol {
        bundle = bundle.with(
            DatasetCategory::Aerosol,
            MemoryDataset::new().with_field(gridded_field(
                "TOTEXTTAU",
                spec,
                create_constant_grid(w, h, 0.25),
            )),
        );
    }
    bundle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_spec_axes() {
        let spec = grid::SIMPLE_3X3;
        assert_eq!(spec.size(), 9);
        assert_eq!(spec.lats(), vec![38.0, 39.0, 40.0]);
        assert_eq!(spec.lons(), vec![30.0, 31.0, 32.0]);
    }

    #[test]
    fn test_merra2_resolution() {
        let (dx, dy) = grid::MERRA2_GLOBAL.resolution();
        assert!((dx - 0.625).abs() < 1e-9);
        assert!((dy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_synthetic_bundle_categories() {
        let bundle = synthetic_bundle(&grid::SIMPLE_3X3, BundleOptions::ALL);
        assert_eq!(bundle.categories().len(), 4);

        let bundle = synthetic_bundle(&grid::SIMPLE_3X3, BundleOptions::TEMPERATURE_ONLY);
        assert_eq!(bundle.categories(), vec![DatasetCategory::Atmospheric]);
    }
}
