use thiserror::Error;

/// Errors reported before any distance is sampled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// An edge does not start where the previous edge of its contour ends.
    #[error("contour {contour} is not closed: edge {edge} does not start at the end of its predecessor")]
    Discontinuous { contour: usize, edge: usize },
    #[error("projection scale must be non-zero on both axes")]
    InvalidProjection,
    #[error("output dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
