//! Tests for reading real MERRA-2 granules.
//!
//! These skip unless the granule is available under `TEST_DATA_DIR` or
//! `crates/netcdf-parser/testdata/`.

use field_pipeline::{extract, Dataset, DatasetBundle};
use geo_common::DatasetCategory;
use netcdf_parser::{read_field, NetcdfDataset, NetCdfError};
use test_utils::require_test_file;

const SLV_GRANULE: &str = "MERRA2_400.tavg1_2d_slv_Nx.20250901.nc4";

#[test]
fn test_open_missing_granule() {
    let result = NetcdfDataset::open("/nonexistent/MERRA2.nc4");
    assert!(matches!(result, Err(NetCdfError::IoError(_))));
}

#[test]
fn test_slv_granule_has_temperature() {
    let path = require_test_file!(SLV_GRANULE);
    let dataset = NetcdfDataset::open(&path).unwrap();
    assert!(dataset.has("T2M"));
    assert!(dataset.variable_names().iter().any(|v| v == "U10M"));

    let field = dataset.get("T2M").unwrap();
    assert_eq!(field.units(), Some("K"));
    assert!(field.has_time());
    assert_eq!(field.time_len(), 24);
}

#[test]
fn test_slv_granule_values_are_physical() {
    let path = require_test_file!(SLV_GRANULE);
    let field = read_field(&path, "T2M").unwrap();
    let finite: Vec<f64> = field.values().iter().copied().filter(|v| v.is_finite()).collect();
    assert!(!finite.is_empty());
    assert!(finite.iter().all(|&t| (180.0..340.0).contains(&t)));
}

#[test]
fn test_slv_granule_extracts() {
    let path = require_test_file!(SLV_GRANULE);
    let bundle = DatasetBundle::new().with(
        DatasetCategory::Atmospheric,
        NetcdfDataset::open(&path).unwrap(),
    );
    let extracted = extract(&bundle).unwrap();
    assert_eq!(extracted.temperature.name(), "T2M");
    assert!(extracted.u_wind.is_some());
}
