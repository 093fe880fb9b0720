//! Binarization: color photo to ink/paper mask.
//!
//! Grayscale conversion, Gaussian pre-blur, then a Gaussian-weighted adaptive
//! threshold so ink stays foreground under uneven lighting.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;

/// Foreground (ink) pixel value in binary images.
pub const FOREGROUND: u8 = 255;
/// Background (paper) pixel value in binary images.
pub const BACKGROUND: u8 = 0;

/// Configuration for binarization.
#[derive(Debug, Clone)]
pub struct BinarizeConfig {
    /// Sigma of the noise-suppression blur (a 5x5 kernel's default sigma).
    pub blur_sigma: f32,
    /// Sigma of the Gaussian window used as the local threshold (an 11px block).
    pub block_sigma: f32,
    /// Amount a pixel must be darker than its local mean to count as ink.
    pub offset: i16,
}

impl Default for BinarizeConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            block_sigma: 2.0,
            offset: 2,
        }
    }
}

/// Converts an image into a binary ink mask.
#[derive(Debug, Clone, Default)]
pub struct Binarizer {
    config: BinarizeConfig,
}

impl Binarizer {
    /// Creates a binarizer with the given configuration.
    #[must_use]
    pub const fn new(config: BinarizeConfig) -> Self {
        Self { config }
    }

    /// Binarizes a decoded image. Ink becomes [`FOREGROUND`], paper [`BACKGROUND`].
    #[must_use]
    pub fn binarize(&self, image: &DynamicImage) -> GrayImage {
        self.binarize_luma(&image.to_luma8())
    }

    /// Binarizes an already-grayscale image.
    #[must_use]
    pub fn binarize_luma(&self, gray: &GrayImage) -> GrayImage {
        let blurred = gaussian_blur_f32(gray, self.config.blur_sigma);
        let local_mean = gaussian_blur_f32(&blurred, self.config.block_sigma);

        let offset = self.config.offset;
        GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            let value = i16::from(blurred.get_pixel(x, y).0[0]);
            let threshold = i16::from(local_mean.get_pixel(x, y).0[0]) - offset;
            if value <= threshold {
                Luma([FOREGROUND])
            } else {
                Luma([BACKGROUND])
            }
        })
    }
}

/// Counts foreground pixels.
#[must_use]
pub fn count_foreground(image: &GrayImage) -> u64 {
    image.pixels().filter(|p| p.0[0] != BACKGROUND).count() as u64
}
