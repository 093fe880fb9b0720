//! Error types for answer-sheet reading.

use thiserror::Error;

/// Result type alias for omr-core operations.
pub type Result<T> = std::result::Result<T, OmrError>;

/// Broad failure category, used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad configuration or unusable input. Surfaced before any pipeline stage runs.
    Validation,
    /// Automatic grid search found no plausible region. Callers should offer
    /// a manual-region fallback instead of retrying.
    Detection,
}

/// Errors produced while validating options or reading a sheet.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum OmrError {
    /// Processing options or engine configuration are invalid.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Image bytes could not be decoded.
    #[error("failed to decode image")]
    ImageDecode(#[source] image::ImageError),

    /// Decoded image is below the minimum usable dimensions.
    #[error("image too small: {width}x{height} (minimum {min_width}x{min_height})")]
    ImageTooSmall {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },

    /// Caller-supplied region does not lie inside the image.
    #[error("region {region} does not fit inside {width}x{height} image")]
    InvalidRegion {
        region: String,
        width: u32,
        height: u32,
    },

    /// No answer grid could be located automatically.
    #[error("answer grid not found: {0}")]
    GridNotFound(String),
}

impl OmrError {
    /// Returns the failure category for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::GridNotFound(_) => ErrorKind::Detection,
            Self::InvalidOptions(_)
            | Self::ImageDecode(_)
            | Self::ImageTooSmall { .. }
            | Self::InvalidRegion { .. } => ErrorKind::Validation,
        }
    }

    /// Returns true for configuration and input errors.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation)
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidOptions(message.into())
    }
}
