//! Map rendering for processed reanalysis fields.
//!
//! This crate turns [`field_pipeline::ProcessedFields`] into PNG images:
//! - **Composite map**: precipitation, drought index and aerosol layers over
//!   a land background, temperature isolines, wind arrows, graticule
//! - **Quick plot**: temperature and drought index panels side by side
//!
//! Images are rasterized into an RGBA [`Canvas`] and encoded by the
//! dependency-light PNG writer in [`png`].

pub mod canvas;
pub mod colormap;
pub mod contour;
pub mod error;
pub mod map;
pub mod png;

pub use canvas::Canvas;
pub use colormap::{Color, Colormap};
pub use error::{RenderError, RenderResult};
pub use map::{timestamped_name, PngRenderer, Renderer};
