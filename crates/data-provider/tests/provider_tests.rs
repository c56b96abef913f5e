//! Tests for bundle assembly and local granule discovery.

use std::collections::HashMap;

use async_trait::async_trait;
use data_provider::{
    fetch_bundle, DataProvider, DatasetNames, LocalDirectoryProvider, ProviderError,
};
use field_pipeline::{Dataset, MemoryDataset};
use geo_common::{BoundingBox, DateRange, DatasetCategory};
use test_utils::{create_constant_grid, grid, gridded_field};

// ============================================================================
// Mock provider
// ============================================================================

enum Outcome {
    Found,
    Empty,
    Fail,
}

struct MockProvider {
    outcomes: HashMap<&'static str, Outcome>,
}

impl MockProvider {
    fn new(outcomes: Vec<(&'static str, Outcome)>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
        }
    }
}

#[async_trait]
impl DataProvider for MockProvider {
    async fn open(
        &self,
        short_name: &str,
        _dates: &DateRange,
        _bbox: &BoundingBox,
    ) -> data_provider::Result<Option<Box<dyn Dataset>>> {
        match self.outcomes.get(short_name) {
            Some(Outcome::Found) => {
                let field = gridded_field("T2M", &grid::SIMPLE_3X3, create_constant_grid(3, 3, 290.0));
                Ok(Some(Box::new(MemoryDataset::new().with_field(field))))
            }
            Some(Outcome::Fail) => Err(ProviderError::Config(format!("{short_name} broken"))),
            Some(Outcome::Empty) | None => Ok(None),
        }
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

fn period() -> DateRange {
    DateRange::default_period()
}

// ============================================================================
// fetch_bundle tests
// ============================================================================

#[tokio::test]
async fn test_fetch_bundle_all_categories() {
    let provider = MockProvider::new(vec![
        ("M2T1NXSLV", Outcome::Found),
        ("M2T1NXFLX", Outcome::Found),
        ("M2T1NXLND", Outcome::Found),
        ("M2T1NXAER", Outcome::Found),
    ]);
    let bundle = fetch_bundle(&provider, &period(), &BoundingBox::DEFAULT, &DatasetNames::default())
        .await
        .unwrap();
    assert_eq!(bundle.categories().len(), 4);
}

#[tokio::test]
async fn test_fetch_bundle_missing_atmospheric_fails() {
    let provider = MockProvider::new(vec![("M2T1NXFLX", Outcome::Found)]);
    let result =
        fetch_bundle(&provider, &period(), &BoundingBox::DEFAULT, &DatasetNames::default()).await;
    match result {
        Err(ProviderError::NoResults { short_name, .. }) => assert_eq!(short_name, "M2T1NXSLV"),
        other => panic!("unexpected result: {:?}", other.map(|b| b.categories())),
    }
}

#[tokio::test]
async fn test_fetch_bundle_atmospheric_error_propagates() {
    let provider = MockProvider::new(vec![("M2T1NXSLV", Outcome::Fail)]);
    let result =
        fetch_bundle(&provider, &period(), &BoundingBox::DEFAULT, &DatasetNames::default()).await;
    assert!(matches!(result, Err(ProviderError::Config(_))));
}

#[tokio::test]
async fn test_fetch_bundle_optional_failures_tolerated() {
    let provider = MockProvider::new(vec![
        ("M2T1NXSLV", Outcome::Found),
        ("M2T1NXFLX", Outcome::Fail),
        ("M2T1NXLND", Outcome::Empty),
    ]);
    let bundle = fetch_bundle(&provider, &period(), &BoundingBox::DEFAULT, &DatasetNames::default())
        .await
        .unwrap();
    assert_eq!(bundle.categories(), vec![DatasetCategory::Atmospheric]);
    assert!(bundle.get(DatasetCategory::Flux).is_none());
}

#[tokio::test]
async fn test_fetch_bundle_custom_names() {
    let provider = MockProvider::new(vec![("CUSTOM_ATM", Outcome::Found)]);
    let names = DatasetNames {
        atmospheric: "CUSTOM_ATM".to_string(),
        ..DatasetNames::default()
    };
    let bundle = fetch_bundle(&provider, &period(), &BoundingBox::DEFAULT, &names)
        .await
        .unwrap();
    assert!(bundle.get(DatasetCategory::Atmospheric).is_some());
}

// ============================================================================
// LocalDirectoryProvider tests
// ============================================================================

fn touch(dir: &std::path::Path, name: &str) {
    std::fs::write(dir.join(name), b"").unwrap();
}

#[test]
fn test_find_granules_by_product_and_date() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "MERRA2_400.tavg1_2d_slv_Nx.20250902.nc4");
    touch(dir.path(), "MERRA2_400.tavg1_2d_slv_Nx.20250901.nc4");
    touch(dir.path(), "MERRA2_400.tavg1_2d_slv_Nx.20240101.nc4");
    touch(dir.path(), "MERRA2_400.tavg1_2d_flx_Nx.20250901.nc4");
    touch(dir.path(), "notes.txt");

    let provider = LocalDirectoryProvider::new(dir.path());
    let found = provider.find_granules("M2T1NXSLV", &period());
    let names: Vec<String> = found
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "MERRA2_400.tavg1_2d_slv_Nx.20250901.nc4",
            "MERRA2_400.tavg1_2d_slv_Nx.20250902.nc4",
        ]
    );
}

#[test]
fn test_find_granules_by_short_name_without_date() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("aer")).unwrap();
    touch(&dir.path().join("aer"), "M2T1NXAER_sample.nc");

    let provider = LocalDirectoryProvider::new(dir.path());
    assert_eq!(provider.find_granules("M2T1NXAER", &period()).len(), 1);
    assert!(provider.find_granules("M2T1NXLND", &period()).is_empty());
}

#[tokio::test]
async fn test_local_open_without_match_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let provider = LocalDirectoryProvider::new(dir.path());
    let result = provider
        .open("M2T1NXLND", &period(), &BoundingBox::DEFAULT)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_local_open_missing_directory() {
    let provider = LocalDirectoryProvider::new("/nonexistent/merra2");
    let result = provider.open("M2T1NXSLV", &period(), &BoundingBox::DEFAULT).await;
    assert!(matches!(result, Err(ProviderError::Config(_))));
}
