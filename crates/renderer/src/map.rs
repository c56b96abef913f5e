//! Composite weather map and quick plot rendering.
//!
//! Both images are laid out on the temperature grid: every grid cell becomes
//! a `cell_pixels` square, north at the top. Other layers are sampled onto
//! that frame by nearest cell, so a layer on a different grid still lines up
//! geographically.

use std::path::{Path, PathBuf};

use chrono::Utc;
use field_pipeline::{ProcessedFields, SpatialField};
use geo_common::{BoundingBox, DateRange};
use ndarray::{Array1, Array2, Axis};
use tracing::{debug, info};

use crate::canvas::Canvas;
use crate::colormap::{Color, Colormap};
use crate::contour::{evenly_spaced_levels, march_squares};
use crate::error::{RenderError, RenderResult};
use crate::png::{annotate, create_png_auto};

/// Light land tone under the composite map.
const LAND_BACKGROUND: Color = Color::rgb(238, 234, 222);

const PRECIP_OPACITY: f64 = 0.85;
const DROUGHT_OPACITY: f64 = 0.38;
const AEROSOL_OPACITY: f64 = 0.25;

const CONTOUR_LEVELS: usize = 10;
const WIND_STRIDE: usize = 6;
const WIND_COLOR: Color = Color::new(64, 64, 64, 230);
const GRATICULE_COLOR: Color = Color::new(90, 90, 90, 140);
const GRATICULE_DASH: (usize, usize) = (4, 4);

/// Map output.
///
/// Implementations write one image per call and return its path.
pub trait Renderer: Send + Sync {
    /// Composite map of every available layer.
    fn render_map(
        &self,
        fields: &ProcessedFields,
        dates: &DateRange,
        bbox: &BoundingBox,
    ) -> RenderResult<PathBuf>;

    /// Side-by-side temperature and drought index panels.
    fn render_quick_plot(
        &self,
        fields: &ProcessedFields,
        dates: &DateRange,
        bbox: &BoundingBox,
    ) -> RenderResult<PathBuf>;
}

/// Renders PNG files into an output directory.
#[derive(Debug, Clone)]
pub struct PngRenderer {
    output_dir: PathBuf,
    cell_pixels: usize,
}

impl PngRenderer {
    pub const DEFAULT_CELL_PIXELS: usize = 16;

    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            cell_pixels: Self::DEFAULT_CELL_PIXELS,
        }
    }

    pub fn with_cell_pixels(mut self, cell_pixels: usize) -> Self {
        self.cell_pixels = cell_pixels.max(1);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Draw the composite map and return the encoded pixels.
    pub fn draw_map(&self, fields: &ProcessedFields) -> RenderResult<Canvas> {
        let frame = Frame::new(&fields.temperature_c, self.cell_pixels)?;
        let mut canvas = Canvas::new(frame.width, frame.height, LAND_BACKGROUND);

        if let Some(precip) = &fields.precipitation_mm_day {
            paint_layer(&mut canvas, &frame, 0, precip, Colormap::BLUES, PRECIP_OPACITY, None);
        }
        paint_layer(
            &mut canvas,
            &frame,
            0,
            &fields.drought_index,
            Colormap::REDS,
            DROUGHT_OPACITY,
            Some((0.0, 1.0)),
        );
        if let Some(aerosol) = &fields.aerosol {
            paint_layer(&mut canvas, &frame, 0, aerosol, Colormap::YLGNBU_R, AEROSOL_OPACITY, None);
        }

        draw_contours(&mut canvas, &frame, &fields.temperature_c);
        if let (Some(u), Some(v)) = (&fields.u_wind, &fields.v_wind) {
            draw_wind(&mut canvas, &frame, u, v);
        }
        draw_graticule(&mut canvas, &frame);

        Ok(canvas)
    }

    /// Draw the two quick plot panels.
    pub fn draw_quick_plot(&self, fields: &ProcessedFields) -> RenderResult<Canvas> {
        let frame = Frame::new(&fields.temperature_c, self.cell_pixels)?;
        let gap = self.cell_pixels;
        let mut canvas = Canvas::new(frame.width * 2 + gap, frame.height, Color::WHITE);

        paint_layer(
            &mut canvas,
            &frame,
            0,
            &fields.temperature_c,
            Colormap::RDYLBU_R,
            1.0,
            None,
        );
        paint_layer(
            &mut canvas,
            &frame,
            frame.width + gap,
            &fields.drought_index,
            Colormap::REDS,
            1.0,
            Some((0.0, 1.0)),
        );
        Ok(canvas)
    }

    fn write(&self, prefix: &str, canvas: Canvas, title: String) -> RenderResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let (width, height) = (canvas.width(), canvas.height());
        let png = create_png_auto(canvas.pixels(), width, height)?;
        let png = annotate(png, &[("Title", title.as_str()), ("Software", "reanalysis-risk")]);

        let path = self.output_dir.join(timestamped_name(prefix));
        std::fs::write(&path, &png)?;
        info!(path = %path.display(), width, height, bytes = png.len(), "Wrote image");
        Ok(path)
    }
}

impl Renderer for PngRenderer {
    fn render_map(
        &self,
        fields: &ProcessedFields,
        dates: &DateRange,
        bbox: &BoundingBox,
    ) -> RenderResult<PathBuf> {
        let canvas = self.draw_map(fields)?;
        let title = format!("MERRA-2 weather map, {}, {}", dates, bbox);
        self.write("weather_map", canvas, title)
    }

    fn render_quick_plot(
        &self,
        fields: &ProcessedFields,
        dates: &DateRange,
        bbox: &BoundingBox,
    ) -> RenderResult<PathBuf> {
        let canvas = self.draw_quick_plot(fields)?;
        let title = format!("Temperature and drought index, {}, {}", dates, bbox);
        self.write("quick_plot", canvas, title)
    }
}

/// `<prefix>_<UTC %Y%m%dT%H%M%S>.png`
pub fn timestamped_name(prefix: &str) -> String {
    format!("{}_{}.png", prefix, Utc::now().format("%Y%m%dT%H%M%S"))
}

// =============================================================================
// Frame: pixel <-> geographic mapping
// =============================================================================

/// Pixel geometry derived from the reference (temperature) grid.
#[derive(Debug, Clone)]
struct Frame {
    width: usize,
    height: usize,
    cell: usize,
    /// West edge and east edge in degrees
    west: f64,
    east: f64,
    /// North edge and south edge in degrees
    north: f64,
    south: f64,
}

impl Frame {
    fn new(reference: &SpatialField, cell: usize) -> RenderResult<Self> {
        let (nlat, nlon) = reference.dim();
        if nlat == 0 || nlon == 0 {
            return Err(RenderError::EmptyField(reference.name.clone()));
        }
        let (west, east) = axis_edges(&reference.lons);
        let (south, north) = axis_edges(&reference.lats);
        Ok(Self {
            width: nlon * cell,
            height: nlat * cell,
            cell,
            west,
            east,
            north,
            south,
        })
    }

    fn lon_at(&self, x: usize) -> f64 {
        self.west + (x as f64 + 0.5) / self.width as f64 * (self.east - self.west)
    }

    fn lat_at(&self, y: usize) -> f64 {
        self.north - (y as f64 + 0.5) / self.height as f64 * (self.north - self.south)
    }

    fn x_of(&self, lon: f64) -> f64 {
        (lon - self.west) / (self.east - self.west) * self.width as f64
    }

    fn y_of(&self, lat: f64) -> f64 {
        (self.north - lat) / (self.north - self.south) * self.height as f64
    }
}

/// Outer edges of a coordinate axis, half a cell beyond the extreme centers.
fn axis_edges(axis: &Array1<f64>) -> (f64, f64) {
    let min = axis.iter().copied().fold(f64::INFINITY, f64::min);
    let max = axis.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let half = if axis.len() > 1 {
        (max - min) / (axis.len() - 1) as f64 / 2.0
    } else {
        0.5
    };
    let half = if half > 0.0 { half } else { 0.5 };
    (min - half, max + half)
}

/// Index of the nearest coordinate, if within half a cell of the axis.
fn nearest_index(axis: &Array1<f64>, value: f64) -> Option<usize> {
    let (lo, hi) = axis_edges(axis);
    if value < lo || value > hi {
        return None;
    }
    axis.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - value).abs().total_cmp(&(*b - value).abs()))
        .map(|(i, _)| i)
}

fn finite_range(values: &Array2<f64>) -> Option<(f64, f64)> {
    let mut iter = values.iter().copied().filter(|v| v.is_finite());
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

// =============================================================================
// Layers
// =============================================================================

/// Fill a panel starting at column `x_offset` with a colored field.
///
/// `range` fixes the color scale; otherwise the field's own finite range is
/// used. NaN cells are left untouched.
fn paint_layer(
    canvas: &mut Canvas,
    frame: &Frame,
    x_offset: usize,
    field: &SpatialField,
    colormap: Colormap,
    opacity: f64,
    range: Option<(f64, f64)>,
) {
    let Some((min, max)) = range.or_else(|| finite_range(&field.values)) else {
        debug!(layer = %field.name, "Layer has no finite values, skipping");
        return;
    };

    let cols: Vec<Option<usize>> = (0..frame.width)
        .map(|x| nearest_index(&field.lons, frame.lon_at(x)))
        .collect();
    let rows: Vec<Option<usize>> = (0..frame.height)
        .map(|y| nearest_index(&field.lats, frame.lat_at(y)))
        .collect();

    for (y, row) in rows.iter().enumerate() {
        let Some(i) = row else { continue };
        for (x, col) in cols.iter().enumerate() {
            let Some(j) = col else { continue };
            let value = field.values[[*i, *j]];
            if !value.is_finite() {
                continue;
            }
            let color = colormap.sample_range(value, min, max).with_opacity(opacity);
            canvas.blend((x + x_offset) as i64, y as i64, color);
        }
    }
}

/// Reference field rows ordered north to south.
fn north_up(field: &SpatialField) -> Array2<f64> {
    let ascending = field.lats.len() > 1 && field.lats[0] < field.lats[field.lats.len() - 1];
    if ascending {
        let mut flipped = field.values.clone();
        flipped.invert_axis(Axis(0));
        flipped
    } else {
        field.values.clone()
    }
}

fn draw_contours(canvas: &mut Canvas, frame: &Frame, temperature: &SpatialField) {
    let Some((min, max)) = finite_range(&temperature.values) else {
        return;
    };
    let grid = north_up(temperature);
    let cell = frame.cell as f64;
    // Grid units are cell centers
    let to_px = |v: f64| (v + 0.5) * cell;

    for level in evenly_spaced_levels(min, max, CONTOUR_LEVELS) {
        for seg in march_squares(&grid, level) {
            canvas.draw_line(
                to_px(seg.start.x),
                to_px(seg.start.y),
                to_px(seg.end.x),
                to_px(seg.end.y),
                Color::BLACK,
            );
        }
    }
}

/// Arrows every `WIND_STRIDE` cells, longest arrow 2.5 cells.
fn draw_wind(canvas: &mut Canvas, frame: &Frame, u: &SpatialField, v: &SpatialField) {
    if u.dim() != v.dim() {
        debug!("Wind components on different grids, skipping vectors");
        return;
    }
    let max_speed = u
        .values
        .iter()
        .zip(v.values.iter())
        .map(|(a, b)| a.hypot(*b))
        .filter(|s| s.is_finite())
        .fold(0.0_f64, f64::max);
    if max_speed <= 0.0 {
        return;
    }
    let scale = 2.5 * frame.cell as f64 / max_speed;

    let (nlat, nlon) = u.dim();
    for i in (0..nlat).step_by(WIND_STRIDE) {
        for j in (0..nlon).step_by(WIND_STRIDE) {
            let (du, dv) = (u.values[[i, j]], v.values[[i, j]]);
            if !du.is_finite() || !dv.is_finite() {
                continue;
            }
            let x = frame.x_of(u.lons[j]);
            let y = frame.y_of(u.lats[i]);
            // Screen y grows southward
            canvas.draw_arrow(x, y, du * scale, -dv * scale, WIND_COLOR);
        }
    }
}

/// Dashed lines on every whole degree inside the frame.
fn draw_graticule(canvas: &mut Canvas, frame: &Frame) {
    let bottom = frame.height as f64 - 1.0;
    let right = frame.width as f64 - 1.0;

    let mut lon = frame.west.ceil();
    while lon <= frame.east {
        let x = frame.x_of(lon);
        canvas.draw_dashed_line(x, 0.0, x, bottom, GRATICULE_COLOR, GRATICULE_DASH);
        lon += 1.0;
    }
    let mut lat = frame.south.ceil();
    while lat <= frame.north {
        let y = frame.y_of(lat);
        canvas.draw_dashed_line(0.0, y, right, y, GRATICULE_COLOR, GRATICULE_DASH);
        lat += 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_axis_edges() {
        let (lo, hi) = axis_edges(&array![30.0, 31.0, 32.0]);
        assert!((lo - 29.5).abs() < 1e-12);
        assert!((hi - 32.5).abs() < 1e-12);

        let (lo, hi) = axis_edges(&array![40.0]);
        assert!((lo - 39.5).abs() < 1e-12);
        assert!((hi - 40.5).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_index() {
        let axis = array![42.0, 41.0, 40.0];
        assert_eq!(nearest_index(&axis, 41.2), Some(1));
        assert_eq!(nearest_index(&axis, 39.6), Some(2));
        assert_eq!(nearest_index(&axis, 38.0), None);
    }

    #[test]
    fn test_timestamped_name() {
        let name = timestamped_name("weather_map");
        assert!(name.starts_with("weather_map_"));
        assert!(name.ends_with(".png"));
        // weather_map_YYYYMMDDTHHMMSS.png
        assert_eq!(name.len(), "weather_map_".len() + 15 + 4);
        assert_eq!(&name[20..21], "T");
    }
}
