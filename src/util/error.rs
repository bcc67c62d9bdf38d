//! Error types for screenloc.
//!
//! Only infrastructure failures are errors. A pattern that is not on screen is
//! reported as an empty result, never as an `Err`.

use thiserror::Error;

/// Result alias for screenloc operations.
pub type ScreenLocResult<T> = std::result::Result<T, ScreenLocError>;

/// Errors that can occur while searching for patterns.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScreenLocError {
    /// Width or height is zero, or their product overflows.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer cannot hold the described image.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A region of interest does not fit inside the image.
    #[error(
        "roi ({x}, {y}, {width}x{height}) out of bounds for {img_width}x{img_height} image"
    )]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// The template cannot be correlated (for example, it has zero variance).
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
    /// A configuration value failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// The search backend failed for a reason other than "not found".
    #[error("search backend failure: {reason}")]
    Backend { reason: String },
    /// Loading or decoding an image file failed.
    #[error("image io: {reason}")]
    ImageIo { reason: String },
}

impl ScreenLocError {
    /// Returns true when the error only means "this template cannot match".
    ///
    /// Callers that search many patterns treat these as an empty result for
    /// the offending pattern instead of aborting the whole batch.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ScreenLocError::DegenerateTemplate { .. })
    }
}
