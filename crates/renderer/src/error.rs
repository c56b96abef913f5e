//! Error types for map rendering.

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid image size {width}x{height}")]
    InvalidSize { width: usize, height: usize },

    #[error("Pixel buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("Field {0} has no cells to draw")]
    EmptyField(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
