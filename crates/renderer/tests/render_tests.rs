//! Tests for the composite map and quick plot renderer.

use field_pipeline::{process_bundle, DroughtStrategy, ProcessedFields, SpatialField};
use geo_common::{BoundingBox, DateRange};
use ndarray::{array, Array2};
use renderer::{Color, Colormap, PngRenderer, RenderError, Renderer};
use test_utils::{grid, synthetic_bundle, BundleOptions};

// ============================================================================
// Helper functions
// ============================================================================

fn processed(options: BundleOptions) -> ProcessedFields {
    let bundle = synthetic_bundle(&grid::ANATOLIA, options);
    let (fields, _) = process_bundle(
        &bundle,
        DateRange::default_period(),
        BoundingBox::DEFAULT,
        0,
    )
    .unwrap();
    fields
}

/// Two-by-two fields with ascending latitudes: north row is hot and dry.
fn tiny_fields(drought: Array2<f64>) -> ProcessedFields {
    let lats = vec![40.0, 41.0];
    let lons = vec![30.0, 31.0];
    let temperature =
        SpatialField::new("T2M", lats.clone(), lons.clone(), array![[0.0, 0.0], [10.0, 10.0]])
            .unwrap();
    let drought = SpatialField::new("drought_index", lats, lons, drought).unwrap();
    ProcessedFields {
        temperature_c: temperature,
        precipitation_mm_day: None,
        u_wind: None,
        v_wind: None,
        wind_speed: None,
        soil_moisture: None,
        drought_index: drought,
        drought_strategy: DroughtStrategy::SoilMoisture,
        aerosol: None,
    }
}

fn png_size(bytes: &[u8]) -> (u32, u32) {
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    (width, height)
}

// ============================================================================
// File output
// ============================================================================

#[test]
fn test_render_map_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = PngRenderer::new(dir.path()).with_cell_pixels(4);
    let fields = processed(BundleOptions::ALL);

    let path = renderer
        .render_map(&fields, &DateRange::default_period(), &BoundingBox::DEFAULT)
        .unwrap();

    assert_eq!(path.parent(), Some(dir.path()));
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("weather_map_"), "{name}");
    assert!(name.ends_with(".png"));

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], &[137, 80, 78, 71]);
    // Default region on a 1° grid: 20 lons x 7 lats
    assert_eq!(png_size(&bytes), (80, 28));
}

#[test]
fn test_render_quick_plot_has_two_panels() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = PngRenderer::new(dir.path()).with_cell_pixels(4);
    let fields = processed(BundleOptions::ALL);

    let path = renderer
        .render_quick_plot(&fields, &DateRange::default_period(), &BoundingBox::DEFAULT)
        .unwrap();

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("quick_plot_"), "{name}");
    let bytes = std::fs::read(&path).unwrap();
    // Two 80px panels plus a one-cell gap
    assert_eq!(png_size(&bytes), (164, 28));
}

#[test]
fn test_render_creates_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("maps").join("today");
    let renderer = PngRenderer::new(&nested).with_cell_pixels(2);
    let fields = processed(BundleOptions::TEMPERATURE_ONLY);

    let path = renderer
        .render_map(&fields, &DateRange::default_period(), &BoundingBox::DEFAULT)
        .unwrap();
    assert!(path.starts_with(&nested));
    assert!(path.exists());
}

// ============================================================================
// Pixel content
// ============================================================================

#[test]
fn test_quick_plot_is_north_up() {
    let renderer = PngRenderer::new("unused").with_cell_pixels(2);
    let fields = tiny_fields(array![[0.0, 0.0], [1.0, 1.0]]);
    let canvas = renderer.draw_quick_plot(&fields).unwrap();

    // Hot north row at the top, cold south row at the bottom
    assert_eq!(canvas.get(0, 0), Some(Colormap::RDYLBU_R.sample(1.0)));
    assert_eq!(canvas.get(0, 3), Some(Colormap::RDYLBU_R.sample(0.0)));

    // Drought panel starts after the temperature panel and a 2px gap
    assert_eq!(canvas.get(6, 0), Some(Colormap::REDS.sample(1.0)));
    assert_eq!(canvas.get(6, 3), Some(Colormap::REDS.sample(0.0)));
}

#[test]
fn test_quick_plot_nan_cells_left_blank() {
    let renderer = PngRenderer::new("unused").with_cell_pixels(2);
    let fields = tiny_fields(array![[f64::NAN, 0.5], [0.5, 0.5]]);
    let canvas = renderer.draw_quick_plot(&fields).unwrap();

    // South-west drought cell is NaN: bottom-left of the right panel stays white
    assert_eq!(canvas.get(6, 3), Some(Color::WHITE));
    assert_ne!(canvas.get(8, 3), Some(Color::WHITE));
}

#[test]
fn test_map_draws_contours_over_background() {
    let renderer = PngRenderer::new("unused").with_cell_pixels(8);
    let fields = processed(BundleOptions::TEMPERATURE_ONLY);
    let canvas = renderer.draw_map(&fields).unwrap();

    let has_black = canvas
        .pixels()
        .chunks_exact(4)
        .any(|px| px[0] < 40 && px[1] < 40 && px[2] < 40);
    assert!(has_black, "expected temperature isolines");
}

#[test]
fn test_map_of_empty_field_fails() {
    let renderer = PngRenderer::new("unused");
    let empty = SpatialField::new("T2M", vec![], vec![], Array2::zeros((0, 0))).unwrap();
    let mut fields = tiny_fields(array![[0.0, 0.0], [0.0, 0.0]]);
    fields.temperature_c = empty;

    assert!(matches!(
        renderer.draw_map(&fields),
        Err(RenderError::EmptyField(_))
    ));
}
