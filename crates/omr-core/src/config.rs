//! Engine configuration.

use crate::error::{OmrError, Result};
use crate::stages::{
    BinarizeConfig, CellConfig, ClassifierConfig, LocatorConfig, SuppressorConfig,
};

/// Minimum accepted image width in pixels.
pub const DEFAULT_MIN_WIDTH: u32 = 800;
/// Minimum accepted image height in pixels.
pub const DEFAULT_MIN_HEIGHT: u32 = 600;

/// Complete configuration for [`crate::OmrEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Binarization settings.
    pub binarize: BinarizeConfig,
    /// Region search settings.
    pub locator: LocatorConfig,
    /// Grid-line suppression settings.
    pub suppressor: SuppressorConfig,
    /// Cell measurement settings.
    pub cells: CellConfig,
    /// Verdict thresholds.
    pub classifier: ClassifierConfig,
    /// Smallest accepted image width.
    pub min_width: u32,
    /// Smallest accepted image height.
    pub min_height: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binarize: BinarizeConfig::default(),
            locator: LocatorConfig::default(),
            suppressor: SuppressorConfig::default(),
            cells: CellConfig::default(),
            classifier: ClassifierConfig::default(),
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
        }
    }
}

impl EngineConfig {
    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`OmrError::InvalidOptions`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let b = &self.binarize;
        if !(b.blur_sigma > 0.0 && b.blur_sigma.is_finite()) {
            return Err(OmrError::invalid(format!(
                "binarize.blur_sigma must be positive, got {}",
                b.blur_sigma
            )));
        }
        if !(b.block_sigma > 0.0 && b.block_sigma.is_finite()) {
            return Err(OmrError::invalid(format!(
                "binarize.block_sigma must be positive, got {}",
                b.block_sigma
            )));
        }

        let l = &self.locator;
        if !(0.0..1.0).contains(&l.min_area_ratio) {
            return Err(OmrError::invalid(format!(
                "locator.min_area_ratio must be in [0, 1), got {}",
                l.min_area_ratio
            )));
        }
        if !(l.poly_epsilon > 0.0 && l.poly_epsilon < 1.0) {
            return Err(OmrError::invalid(format!(
                "locator.poly_epsilon must be in (0, 1), got {}",
                l.poly_epsilon
            )));
        }
        if l.score_kernel_divisor == 0 {
            return Err(OmrError::invalid("locator.score_kernel_divisor must be > 0"));
        }

        if self.suppressor.kernel_divisor == 0 {
            return Err(OmrError::invalid("suppressor.kernel_divisor must be > 0"));
        }
        if self.suppressor.iterations == 0 {
            return Err(OmrError::invalid("suppressor.iterations must be > 0"));
        }

        if !(0.0..0.5).contains(&self.cells.inset_ratio) {
            return Err(OmrError::invalid(format!(
                "cells.inset_ratio must be in [0, 0.5), got {}",
                self.cells.inset_ratio
            )));
        }

        let c = &self.classifier;
        if !(c.marked_ratio >= 1.0 && c.marked_ratio.is_finite()) {
            return Err(OmrError::invalid(format!(
                "classifier.marked_ratio must be >= 1, got {}",
                c.marked_ratio
            )));
        }
        for (name, value) in [
            ("multiple_ratio", c.multiple_ratio),
            ("low_confidence", c.low_confidence),
            ("min_mark_density", c.min_mark_density),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(OmrError::invalid(format!(
                    "classifier.{name} must be in [0, 1], got {value}"
                )));
            }
        }

        if self.min_width == 0 || self.min_height == 0 {
            return Err(OmrError::invalid("minimum image dimensions must be > 0"));
        }

        Ok(())
    }
}
