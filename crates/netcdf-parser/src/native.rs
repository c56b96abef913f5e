//! Native NetCDF reading using the netcdf library.
//!
//! The netcdf library wraps libnetcdf/HDF5 and needs a file path, so every
//! read opens the file by path. Granules are small enough (a few tens of MB
//! per day) that reopening is cheaper than keeping HDF5 handles alive across
//! threads.

use std::path::Path;
use std::sync::Once;

use field_pipeline::GriddedField;
use ndarray::Array3;
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};

/// Accepted names for the latitude coordinate.
pub const LAT_NAMES: [&str; 2] = ["lat", "latitude"];

/// Accepted names for the longitude coordinate.
pub const LON_NAMES: [&str; 2] = ["lon", "longitude"];

/// Name of the time coordinate.
pub const TIME_NAME: &str = "time";

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This function disables that output by calling
/// H5Eset_auto2 with null handlers. It only needs to be called once per
/// process, but is safe to call multiple times.
///
/// **Important**: Call this early in `main()` before any HDF5/NetCDF
/// operations occur.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Coordinate layout of a granule.
#[derive(Debug, Clone)]
pub struct GridLayout {
    pub lat_name: String,
    pub lon_name: String,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    /// Names of variables laid out as `(lat, lon)` or `(time, lat, lon)`.
    pub variables: Vec<String>,
}

/// Inspect a granule: coordinates and gridded variable names.
pub fn read_layout<P: AsRef<Path>>(path: P) -> NetCdfResult<GridLayout> {
    silence_hdf5_errors();
    let file = open(path.as_ref())?;

    let lat_name = find_coordinate(&file, &LAT_NAMES)?;
    let lon_name = find_coordinate(&file, &LON_NAMES)?;
    let lats = read_coordinate(&file, &lat_name)?;
    let lons = read_coordinate(&file, &lon_name)?;

    let variables = file
        .variables()
        .filter(|var| {
            let dims = dim_names(var);
            is_grid_layout(&dims, &lat_name, &lon_name)
        })
        .map(|var| var.name())
        .collect();

    Ok(GridLayout {
        lat_name,
        lon_name,
        lats,
        lons,
        variables,
    })
}

/// Read one gridded variable as a field.
pub fn read_field<P: AsRef<Path>>(path: P, name: &str) -> NetCdfResult<GriddedField> {
    let layout = read_layout(path.as_ref())?;
    read_field_with_layout(path.as_ref(), name, &layout)
}

/// Read one gridded variable using an already inspected layout.
pub fn read_field_with_layout(
    path: &Path,
    name: &str,
    layout: &GridLayout,
) -> NetCdfResult<GriddedField> {
    silence_hdf5_errors();
    let file = open(path)?;

    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;

    let dims = dim_names(&var);
    if !is_grid_layout(&dims, &layout.lat_name, &layout.lon_name) {
        return Err(NetCdfError::UnsupportedLayout {
            variable: name.to_string(),
            dims,
        });
    }
    let steps = if dims.len() == 3 {
        var.dimensions()[0].len()
    } else {
        1
    };

    let raw = read_all_f64(&var, name)?;

    let scale_factor = get_f64_attr(&var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f64_attr(&var, "add_offset").unwrap_or(0.0);
    let fill_values: Vec<f64> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|attr| get_f64_attr(&var, attr))
        .collect();

    let data: Vec<f64> = raw
        .into_iter()
        .map(|val| {
            if fill_values.iter().any(|&fill| is_fill(val, fill)) {
                f64::NAN
            } else {
                val * scale_factor + add_offset
            }
        })
        .collect();

    let shape = (steps, layout.lats.len(), layout.lons.len());
    let values = Array3::from_shape_vec(shape, data)
        .map_err(|e| NetCdfError::InvalidFormat(format!("{}: {}", name, e)))?;

    debug!(
        variable = name,
        steps = steps,
        lats = layout.lats.len(),
        lons = layout.lons.len(),
        "Read NetCDF variable"
    );

    let field = if dims.len() == 3 {
        GriddedField::new(name, layout.lats.clone(), layout.lons.clone(), values)
    } else {
        let plane = values.index_axis_move(ndarray::Axis(0), 0);
        GriddedField::without_time(name, layout.lats.clone(), layout.lons.clone(), plane)
    }
    .map_err(|e| NetCdfError::InvalidFormat(e.to_string()))?;

    Ok(match get_string_attr(&var, "units") {
        Some(units) => field.with_units(units),
        None => field,
    })
}

// =============================================================================
// Internal helpers
// =============================================================================

fn open(path: &Path) -> NetCdfResult<netcdf::File> {
    if !path.exists() {
        return Err(NetCdfError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )));
    }
    netcdf::open(path)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))
}

fn find_coordinate(file: &netcdf::File, candidates: &[&str]) -> NetCdfResult<String> {
    candidates
        .iter()
        .find(|name| file.variable(name).is_some())
        .map(|name| name.to_string())
        .ok_or_else(|| NetCdfError::MissingData(format!("coordinate {:?}", candidates)))
}

fn read_coordinate(file: &netcdf::File, name: &str) -> NetCdfResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;
    read_all_f64(&var, name)
}

/// Read all extents as f64, falling back to an f32 read for float variables.
fn read_all_f64(var: &netcdf::Variable, name: &str) -> NetCdfResult<Vec<f64>> {
    match var.get_values::<f64, _>(..) {
        Ok(values) => Ok(values),
        Err(_) => var
            .get_values::<f32, _>(..)
            .map(|values| values.into_iter().map(f64::from).collect())
            .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e))),
    }
}

fn dim_names(var: &netcdf::Variable) -> Vec<String> {
    var.dimensions().iter().map(|d| d.name()).collect()
}

/// `(lat, lon)` or `(time, lat, lon)`.
pub(crate) fn is_grid_layout(dims: &[String], lat_name: &str, lon_name: &str) -> bool {
    match dims {
        [lat, lon] => lat == lat_name && lon == lon_name,
        [time, lat, lon] => time == TIME_NAME && lat == lat_name && lon == lon_name,
        _ => false,
    }
}

/// Fill values are stored as f32 in most granules; compare with a relative tolerance.
fn is_fill(value: f64, fill: f64) -> bool {
    value == fill || (value - fill).abs() <= fill.abs() * 1e-6
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get f64 attribute.
fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

/// Helper to get string attribute.
fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
