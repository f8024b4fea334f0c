//! Error types for screenmatch.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result alias for screenmatch operations.
pub type ScreenMatchResult<T> = std::result::Result<T, ScreenMatchError>;

/// Errors that can occur while searching for, waiting on, or acting on
/// template occurrences.
///
/// An empty search is not an error: it is represented by an empty
/// [`SearchResult`](crate::SearchResult).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScreenMatchError {
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The stride is shorter than a row.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer is too small for the described image.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The template does not fit inside the image it is correlated against.
    #[error(
        "template {tpl_width}x{tpl_height} larger than image {img_width}x{img_height}"
    )]
    TemplateLargerThanImage {
        tpl_width: usize,
        tpl_height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Decoding, encoding or reading an image failed.
    #[error("image io: {reason}")]
    ImageIo { reason: String },

    /// Disposal code outside the known ordering policies.
    #[error("disposal priority not valid: {value}")]
    InvalidDisposal { value: u8 },
    /// `order_index` can never be satisfied with the configured cap.
    #[error("order above max occurrences: {order} >= {max_occurrences}")]
    OrderAboveMaxOccurrences { order: usize, max_occurrences: usize },
    /// Similarity threshold outside `[0, 1)`.
    #[error("similarity threshold must be in [0, 1), got {value}")]
    InvalidThreshold { value: f32 },
    /// A template path named explicitly does not exist or is not a file.
    #[error("template route doesn't exist: {}", path.display())]
    TemplateMissing { path: PathBuf },

    /// Element was not visible before the timeout elapsed.
    #[error("cannot find \"{name}\" in {timeout:?}")]
    NotFoundTimeout { name: String, timeout: Duration },
    /// Element was still visible when the timeout elapsed.
    #[error("still present \"{name}\" after {timeout:?}")]
    StillPresentTimeout { name: String, timeout: Duration },
    /// A visibility wait was cancelled through its token.
    #[error("wait for \"{name}\" cancelled")]
    Cancelled { name: String },

    /// Requested occurrence index is beyond the found matches.
    #[error("index above matches for \"{name}\": {index} >= {found}")]
    IndexOutOfRange {
        name: String,
        index: usize,
        found: usize,
    },

    /// The screen source failed to produce an image.
    #[error("screen capture failed: {reason}")]
    Capture { reason: String },
    /// The tap dispatcher failed.
    #[error("tap dispatch failed: {reason}")]
    Dispatch { reason: String },
    /// The template pattern could not be resolved.
    #[error("template resolution failed: {reason}")]
    Resolve { reason: String },
}

impl ScreenMatchError {
    /// Returns true for errors caused by an invalid query configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidDisposal { .. }
                | Self::OrderAboveMaxOccurrences { .. }
                | Self::InvalidThreshold { .. }
                | Self::TemplateMissing { .. }
        )
    }

    /// Returns true for errors raised by an exhausted visibility wait.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::NotFoundTimeout { .. } | Self::StillPresentTimeout { .. }
        )
    }
}

impl From<image::ImageError> for ScreenMatchError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageIo {
            reason: err.to_string(),
        }
    }
}
