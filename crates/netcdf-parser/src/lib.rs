//! NetCDF-4 reader for MERRA-2 style reanalysis granules.
//!
//! Granules are regular lat/lon grids with an optional leading time axis.
//! Variables are read as `f64` with `scale_factor`/`add_offset` applied and
//! fill values mapped to NaN.
//!
//! # Layout
//!
//! ```text
//! float T2M(time, lat, lon)
//!     T2M:units = "K"
//!     T2M:_FillValue = 1.e+15f
//! double lat(lat)
//! double lon(lon)
//! ```
//!
//! [`NetcdfDataset`] implements [`field_pipeline::Dataset`] on top of a file
//! path, so it can sit in a dataset bundle next to in-memory datasets.

pub mod dataset;
pub mod error;
pub mod native;

pub use dataset::NetcdfDataset;
pub use error::{NetCdfError, NetCdfResult};
pub use native::{read_field, silence_hdf5_errors};
