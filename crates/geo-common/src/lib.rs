//! Common types shared across the reanalysis analysis crates and services.

pub mod bbox;
pub mod category;
pub mod dates;
pub mod error;

pub use bbox::{BboxError, BoundingBox};
pub use category::DatasetCategory;
pub use dates::{DateParseError, DateRange};
pub use error::{ServiceError, ServiceResult};
