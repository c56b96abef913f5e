//! Longitude normalization and time/space subsetting.

use geo_common::BoundingBox;
use ndarray::{Array1, Axis};

use crate::error::{PipelineError, Result};
use crate::field::{GriddedField, SpatialField};

/// Map a longitude in 0..360 onto -180..180.
pub fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Remap a 0..360 longitude axis to -180..180 and sort it ascending.
///
/// Data columns move with their coordinate. Fields whose longitudes never
/// exceed 180 are returned unchanged, so applying this twice is a no-op.
pub fn normalize_longitudes(field: &GriddedField) -> GriddedField {
    let needs_wrap = field.lons().iter().any(|&lon| lon > 180.0);
    if !needs_wrap {
        return field.clone();
    }

    let wrapped: Vec<f64> = field.lons().iter().map(|&lon| wrap_longitude(lon)).collect();
    let mut order: Vec<usize> = (0..wrapped.len()).collect();
    order.sort_by(|&a, &b| wrapped[a].total_cmp(&wrapped[b]));

    let lons = Array1::from_iter(order.iter().map(|&i| wrapped[i]));
    let values = field.values().select(Axis(2), &order);
    field.with_lon_axis(lons, values)
}

/// Select one time step and the inclusive lon/lat window of `bbox`.
///
/// The time index is ignored for fields without a time axis. Latitude order
/// of the source axis is preserved, whether ascending or descending.
pub fn subset(field: &GriddedField, time_index: usize, bbox: &BoundingBox) -> Result<SpatialField> {
    bbox.validate()?;

    let field = normalize_longitudes(field);

    let step = if field.has_time() {
        if time_index >= field.time_len() {
            return Err(PipelineError::TimeIndexOutOfRange {
                variable: field.name().to_string(),
                index: time_index,
                len: field.time_len(),
            });
        }
        time_index
    } else {
        0
    };
    let slice = field.values().index_axis(Axis(0), step);

    let lat_idx: Vec<usize> = indices_within(field.lats(), bbox.lat_min, bbox.lat_max);
    let lon_idx: Vec<usize> = indices_within(field.lons(), bbox.lon_min, bbox.lon_max);
    if lat_idx.is_empty() || lon_idx.is_empty() {
        return Err(PipelineError::EmptySubset {
            variable: field.name().to_string(),
            bbox: *bbox,
        });
    }

    let values = slice.select(Axis(0), &lat_idx).select(Axis(1), &lon_idx);
    let lats = lat_idx.iter().map(|&i| field.lats()[i]).collect();
    let lons = lon_idx.iter().map(|&i| field.lons()[i]).collect();

    let mut out = SpatialField::new(field.name(), lats, lons, values)?;
    out.units = field.units().map(str::to_string);
    Ok(out)
}

fn indices_within(axis: &Array1<f64>, min: f64, max: f64) -> Vec<usize> {
    axis.iter()
        .enumerate()
        .filter(|&(_, &v)| v >= min && v <= max)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn field_360() -> GriddedField {
        // lon 0, 90, 180, 270 ; lat 0 ; value = lon
        let values = Array3::from_shape_vec((1, 1, 4), vec![0.0, 90.0, 180.0, 270.0]).unwrap();
        GriddedField::new("x", vec![0.0], vec![0.0, 90.0, 180.0, 270.0], values).unwrap()
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(270.0), -90.0);
        assert_eq!(wrap_longitude(180.0), -180.0);
        assert_eq!(wrap_longitude(45.0), 45.0);
        assert_eq!(wrap_longitude(-90.0), -90.0);
    }

    #[test]
    fn test_normalize_sorts_and_moves_columns() {
        let normalized = normalize_longitudes(&field_360());
        assert_eq!(normalized.lons().to_vec(), vec![-180.0, -90.0, 0.0, 90.0]);
        let row: Vec<f64> = normalized.values().iter().copied().collect();
        assert_eq!(row, vec![180.0, 270.0, 0.0, 90.0]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_longitudes(&field_360());
        let twice = normalize_longitudes(&once);
        assert_eq!(once, twice);
    }
}
