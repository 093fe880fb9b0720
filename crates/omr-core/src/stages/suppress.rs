//! Printed grid-line removal.

use image::GrayImage;

use super::morphology::{open_line, subtract, union, LineAxis};

/// Configuration for grid-line suppression.
#[derive(Debug, Clone)]
pub struct SuppressorConfig {
    /// Line element length is the region side divided by this.
    pub kernel_divisor: u32,
    /// Erosion and dilation passes per opening.
    pub iterations: u32,
}

impl Default for SuppressorConfig {
    fn default() -> Self {
        Self {
            kernel_divisor: 5,
            iterations: 2,
        }
    }
}

/// Strips long horizontal and vertical lines from a binary region.
#[derive(Debug, Clone, Default)]
pub struct GridLineSuppressor {
    config: SuppressorConfig,
}

impl GridLineSuppressor {
    /// Creates a suppressor with the given configuration.
    #[must_use]
    pub const fn new(config: SuppressorConfig) -> Self {
        Self { config }
    }

    /// Returns the long-line mask of `region`.
    #[must_use]
    pub fn line_mask(&self, region: &GrayImage) -> GrayImage {
        let divisor = self.config.kernel_divisor.max(1);
        let iterations = self.config.iterations;
        let horizontal = open_line(
            region,
            LineAxis::Horizontal,
            region.width() / divisor,
            iterations,
        );
        let vertical = open_line(
            region,
            LineAxis::Vertical,
            region.height() / divisor,
            iterations,
        );
        union(&horizontal, &vertical)
    }

    /// Removes the line mask from `region`, leaving only marks.
    #[must_use]
    pub fn suppress(&self, region: &GrayImage) -> GrayImage {
        subtract(region, &self.line_mask(region))
    }
}
