//! Gridded field types.
//!
//! A [`GriddedField`] is what a dataset hands out: a `(time, lat, lon)` cube
//! with its coordinate axes. Subsetting collapses the time axis and produces a
//! [`SpatialField`], which is what derivation, summary and rendering work on.
//! Both are immutable once built; every operation returns a new field.

use ndarray::{Array1, Array2, Array3, Zip};

use crate::error::{PipelineError, Result};

/// A raw variable as read from a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedField {
    name: String,
    units: Option<String>,
    lats: Array1<f64>,
    lons: Array1<f64>,
    /// Shape `(time, lat, lon)`. Fields without a time axis have one step.
    values: Array3<f64>,
    has_time: bool,
}

impl GriddedField {
    /// Build a field with a time axis.
    pub fn new(
        name: impl Into<String>,
        lats: Vec<f64>,
        lons: Vec<f64>,
        values: Array3<f64>,
    ) -> Result<Self> {
        Self::build(name.into(), lats, lons, values, true)
    }

    /// Build a field without a time axis.
    pub fn without_time(
        name: impl Into<String>,
        lats: Vec<f64>,
        lons: Vec<f64>,
        values: Array2<f64>,
    ) -> Result<Self> {
        let values = values.insert_axis(ndarray::Axis(0));
        Self::build(name.into(), lats, lons, values, false)
    }

    fn build(
        name: String,
        lats: Vec<f64>,
        lons: Vec<f64>,
        values: Array3<f64>,
        has_time: bool,
    ) -> Result<Self> {
        let (_, nlat, nlon) = values.dim();
        if nlat != lats.len() || nlon != lons.len() {
            return Err(PipelineError::InvalidField {
                name,
                message: format!(
                    "values are {}x{} but axes are {}x{}",
                    nlat,
                    nlon,
                    lats.len(),
                    lons.len()
                ),
            });
        }
        if values.dim().0 == 0 {
            return Err(PipelineError::InvalidField {
                name,
                message: "time axis is empty".to_string(),
            });
        }
        Ok(Self {
            name,
            units: None,
            lats: Array1::from(lats),
            lons: Array1::from(lons),
            values,
            has_time,
        })
    }

    /// Attach a units string.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    pub fn lats(&self) -> &Array1<f64> {
        &self.lats
    }

    pub fn lons(&self) -> &Array1<f64> {
        &self.lons
    }

    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    pub fn has_time(&self) -> bool {
        self.has_time
    }

    /// Number of time steps (1 for fields without a time axis).
    pub fn time_len(&self) -> usize {
        self.values.dim().0
    }

    /// Replace the longitude axis and values, keeping everything else.
    pub(crate) fn with_lon_axis(&self, lons: Array1<f64>, values: Array3<f64>) -> Self {
        Self {
            name: self.name.clone(),
            units: self.units.clone(),
            lats: self.lats.clone(),
            lons,
            values,
            has_time: self.has_time,
        }
    }
}

/// A single-time 2-D field on a lat × lon grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialField {
    pub name: String,
    pub units: Option<String>,
    pub lats: Array1<f64>,
    pub lons: Array1<f64>,
    /// Shape `(lat, lon)`.
    pub values: Array2<f64>,
}

impl SpatialField {
    pub fn new(
        name: impl Into<String>,
        lats: Vec<f64>,
        lons: Vec<f64>,
        values: Array2<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let (nlat, nlon) = values.dim();
        if nlat != lats.len() || nlon != lons.len() {
            return Err(PipelineError::InvalidField {
                name,
                message: format!(
                    "values are {}x{} but axes are {}x{}",
                    nlat,
                    nlon,
                    lats.len(),
                    lons.len()
                ),
            });
        }
        Ok(Self {
            name,
            units: None,
            lats: Array1::from(lats),
            lons: Array1::from(lons),
            values,
        })
    }

    /// `(lat, lon)` dimensions.
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// New field on the same grid with `f` applied to every cell.
    pub fn map(&self, name: &str, units: Option<&str>, f: impl Fn(f64) -> f64) -> SpatialField {
        self.with_values(name, units, self.values.mapv(f))
    }

    /// New field on the same grid with the given values.
    pub fn with_values(&self, name: &str, units: Option<&str>, values: Array2<f64>) -> SpatialField {
        SpatialField {
            name: name.to_string(),
            units: units.map(str::to_string),
            lats: self.lats.clone(),
            lons: self.lons.clone(),
            values,
        }
    }

    /// Combine two fields on identical grids cell by cell.
    pub fn zip_with(
        &self,
        other: &SpatialField,
        name: &str,
        units: Option<&str>,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<SpatialField> {
        if self.dim() != other.dim() {
            return Err(PipelineError::ShapeMismatch {
                left: self.name.clone(),
                left_shape: self.values.shape().to_vec(),
                right: other.name.clone(),
                right_shape: other.values.shape().to_vec(),
            });
        }
        let values = Zip::from(&self.values)
            .and(&other.values)
            .map_collect(|&a, &b| f(a, b));
        Ok(self.with_values(name, units, values))
    }

    /// Mean over non-NaN cells. `None` when no cell is a number.
    pub fn nan_mean(&self) -> Option<f64> {
        nan_mean(&self.values)
    }

    /// Minimum over non-NaN cells.
    pub fn nan_min(&self) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
    }

    /// Maximum over non-NaN cells.
    pub fn nan_max(&self) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }
}

/// Mean over non-NaN cells of any array. `None` when nothing is left or the
/// result is not finite.
pub fn nan_mean(values: &Array2<f64>) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0_f64, 0_usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        return None;
    }
    let mean = sum / count as f64;
    mean.is_finite().then_some(mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_axis_mismatch_rejected() {
        let result = SpatialField::new("t", vec![1.0], vec![1.0, 2.0], array![[1.0, 2.0, 3.0]]);
        assert!(matches!(result, Err(PipelineError::InvalidField { .. })));
    }

    #[test]
    fn test_nan_mean_skips_nan() {
        let values = array![[1.0, f64::NAN], [3.0, f64::NAN]];
        assert_eq!(nan_mean(&values), Some(2.0));
    }

    #[test]
    fn test_nan_mean_all_nan() {
        let values = array![[f64::NAN, f64::NAN]];
        assert_eq!(nan_mean(&values), None);
    }

    #[test]
    fn test_nan_min_max() {
        let field = SpatialField::new(
            "x",
            vec![0.0],
            vec![0.0, 1.0, 2.0],
            array![[f64::NAN, -1.0, 4.0]],
        )
        .unwrap();
        assert_eq!(field.nan_min(), Some(-1.0));
        assert_eq!(field.nan_max(), Some(4.0));
    }

    #[test]
    fn test_zip_with_shape_mismatch() {
        let a = SpatialField::new("a", vec![0.0], vec![0.0], array![[1.0]]).unwrap();
        let b = SpatialField::new("b", vec![0.0], vec![0.0, 1.0], array![[1.0, 2.0]]).unwrap();
        assert!(matches!(
            a.zip_with(&b, "c", None, |x, y| x + y),
            Err(PipelineError::ShapeMismatch { .. })
        ));
    }
}
