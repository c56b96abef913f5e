//! Reanalysis field pipeline.
//!
//! Turns a bundle of raw gridded variables into processed indicator fields
//! and a scalar summary. Everything here is synchronous and free of I/O;
//! datasets that read from disk do so behind the [`Dataset`] trait.
//!
//! # Architecture
//!
//! ```text
//! DatasetBundle ──► extract ──► ExtractedVariables
//!                                     │
//!                          subset (time index, bbox)
//!                                     │
//!                                     ▼
//!                                  derive ──► ProcessedFields ──► summarize ──► SummaryRecord
//!                    (°C, mm/day, wind speed, drought index)
//! ```

pub mod dataset;
pub mod derive;
pub mod error;
pub mod extract;
pub mod field;
pub mod subset;
pub mod summary;

pub use dataset::{Dataset, DatasetBundle, MemoryDataset};
pub use derive::{derive, DroughtStrategy, ProcessedFields};
pub use error::{PipelineError, Result};
pub use extract::{extract, ExtractedVariables, Quantity};
pub use field::{GriddedField, SpatialField};
pub use subset::{normalize_longitudes, subset};
pub use summary::{summarize, SummaryRecord};

use geo_common::{BoundingBox, DateRange};

/// Run extraction, derivation and summary in one call.
pub fn process_bundle(
    bundle: &DatasetBundle,
    dates: DateRange,
    bbox: BoundingBox,
    time_index: usize,
) -> Result<(ProcessedFields, SummaryRecord)> {
    bbox.validate()?;
    let extracted = extract(bundle)?;
    let processed = derive(&extracted, &bbox, time_index)?;
    let summary = summarize(&processed, dates, bbox);
    Ok((processed, summary))
}
