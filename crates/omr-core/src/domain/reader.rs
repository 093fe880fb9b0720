//! Sheet reader trait.

use super::{DetectionResult, ProcessingOptions};
use crate::error::Result;

/// Reads answers from an encoded answer-sheet photo.
///
/// Implementations hold only immutable configuration, so a single reader
/// may serve concurrent callers as long as each call owns its image buffer.
pub trait SheetReader: Send + Sync {
    /// Returns the name of this reader.
    fn name(&self) -> &'static str;

    /// Decodes `image_data` and reads one answer per question.
    ///
    /// # Errors
    ///
    /// Returns a validation error for undecodable or undersized images and a
    /// detection error when the answer grid cannot be located. No partial
    /// result is ever returned.
    fn read(&self, image_data: &[u8], options: &ProcessingOptions) -> Result<DetectionResult>;
}
