//! Dataset providers for reanalysis collections.
//!
//! A provider turns `(short name, date range, bounding box)` into an opened
//! dataset. Two implementations exist:
//!
//! - [`LocalDirectoryProvider`] picks granules from a directory on disk.
//! - [`EarthdataProvider`] searches NASA CMR, downloads the first matching
//!   granule into a cache directory with retry and backoff, then opens it.
//!
//! [`fetch_bundle`] assembles the four thematic collections into a
//! [`field_pipeline::DatasetBundle`], treating only the atmospheric one as
//! required.

pub mod earthdata;
pub mod error;
pub mod local;
pub mod provider;

pub use earthdata::{EarthdataConfig, EarthdataProvider};
pub use error::{ProviderError, Result};
pub use local::LocalDirectoryProvider;
pub use provider::{fetch_bundle, DataProvider, DatasetNames};
