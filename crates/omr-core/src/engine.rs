//! Pipeline orchestration.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, GrayImage, ImageFormat, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::domain::{
    DetectionMode, DetectionResult, DiagnosticKind, ProcessingOptions, Region, SheetReader,
};
use crate::error::{OmrError, Result};
use crate::ports::DebugStorage;
use crate::stages::{
    extract_region, AnswerClassifier, Binarizer, CellAnalyzer, GridLineSuppressor, RegionLocator,
};

const OVERLAY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const OVERLAY_THICKNESS: u32 = 3;
const DIAGNOSTIC_FORMAT: &str = "jpg";

/// Reads answer sheets end to end.
///
/// Holds only immutable configuration and an optional shared storage handle,
/// so one engine may serve many threads.
pub struct OmrEngine {
    config: EngineConfig,
    binarizer: Binarizer,
    locator: RegionLocator,
    suppressor: GridLineSuppressor,
    cells: CellAnalyzer,
    classifier: AnswerClassifier,
    debug_storage: Option<Arc<dyn DebugStorage>>,
}

impl std::fmt::Debug for OmrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OmrEngine")
            .field("config", &self.config)
            .field("debug_storage", &self.debug_storage.is_some())
            .finish_non_exhaustive()
    }
}

impl OmrEngine {
    /// Creates an engine after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`OmrError::InvalidOptions`] if the configuration is unusable.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            binarizer: Binarizer::new(config.binarize.clone()),
            locator: RegionLocator::new(config.locator.clone()),
            suppressor: GridLineSuppressor::new(config.suppressor.clone()),
            cells: CellAnalyzer::new(config.cells.clone()),
            classifier: AnswerClassifier::new(config.classifier.clone()),
            config,
            debug_storage: None,
        })
    }

    /// Attaches storage for diagnostic images.
    #[must_use]
    pub fn with_debug_storage(mut self, storage: Arc<dyn DebugStorage>) -> Self {
        self.debug_storage = Some(storage);
        self
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decodes `image_data` and reads it.
    ///
    /// # Errors
    ///
    /// Returns [`OmrError::ImageDecode`] for undecodable bytes, otherwise
    /// whatever [`Self::process_image`] returns.
    pub fn process(&self, image_data: &[u8], options: &ProcessingOptions) -> Result<DetectionResult> {
        let image = image::load_from_memory(image_data).map_err(OmrError::ImageDecode)?;
        self.process_image(&image, options)
    }

    /// Reads an already-decoded image.
    ///
    /// # Errors
    ///
    /// Returns a validation error for undersized images or a manual region
    /// outside the image, and [`OmrError::GridNotFound`] when automatic search
    /// fails.
    pub fn process_image(
        &self,
        image: &DynamicImage,
        options: &ProcessingOptions,
    ) -> Result<DetectionResult> {
        self.check_image(image, options)?;

        let binary = self.binarizer.binarize(image);
        let region = self.locator.locate(&binary, options)?;
        debug!("Answer grid region: {region}");

        let cleaned = self.suppressor.suppress(&extract_region(&binary, region));
        let densities =
            self.cells
                .analyze(&cleaned, options.question_count(), options.choice_labels());

        let answers: Vec<_> = (1..=options.question_count())
            .zip(densities)
            .map(|(number, map)| self.classifier.classify(number, map))
            .collect();

        let diagnostics = if options.debug() {
            self.save_diagnostics(image, region, &binary, &cleaned)
        } else {
            BTreeMap::new()
        };

        let result = DetectionResult {
            answers,
            diagnostics,
        };
        let flags = result.flags();
        info!(
            "Read {} questions: {} blank, {} multiple, {} low confidence",
            result.question_count(),
            flags.blank.len(),
            flags.multiple.len(),
            flags.low_confidence.len()
        );
        Ok(result)
    }

    fn check_image(&self, image: &DynamicImage, options: &ProcessingOptions) -> Result<()> {
        let (width, height) = (image.width(), image.height());
        if width < self.config.min_width || height < self.config.min_height {
            return Err(OmrError::ImageTooSmall {
                width,
                height,
                min_width: self.config.min_width,
                min_height: self.config.min_height,
            });
        }

        if options.mode() == DetectionMode::ManualRegion {
            if let Some(region) = options.region() {
                if !region.fits_within(width, height) {
                    return Err(OmrError::InvalidRegion {
                        region: region.to_string(),
                        width,
                        height,
                    });
                }
            }
        }
        Ok(())
    }

    /// Stores diagnostic images. Failures are logged and the label is omitted.
    fn save_diagnostics(
        &self,
        image: &DynamicImage,
        region: Region,
        binary: &GrayImage,
        cleaned: &GrayImage,
    ) -> BTreeMap<DiagnosticKind, String> {
        let mut locations = BTreeMap::new();
        let Some(storage) = &self.debug_storage else {
            debug!("Debug requested but no debug storage configured");
            return locations;
        };

        for kind in DiagnosticKind::ALL {
            let picture = match kind {
                DiagnosticKind::RegionOverlay => region_overlay(image, region),
                DiagnosticKind::Binary => DynamicImage::ImageLuma8(binary.clone()),
                DiagnosticKind::GridSuppressed => DynamicImage::ImageLuma8(cleaned.clone()),
            };
            let saved = encode_jpeg(&picture).and_then(|bytes| {
                storage.save_debug_image(&bytes, kind.label(), DIAGNOSTIC_FORMAT)
            });
            match saved {
                Ok(location) => {
                    debug!("Saved {} diagnostic to {location}", kind.label());
                    locations.insert(kind, location);
                }
                Err(e) => warn!("Failed to save {} diagnostic: {e:#}", kind.label()),
            }
        }
        locations
    }
}

impl SheetReader for OmrEngine {
    fn name(&self) -> &'static str {
        "omr-engine"
    }

    fn read(&self, image_data: &[u8], options: &ProcessingOptions) -> Result<DetectionResult> {
        self.process(image_data, options)
    }
}

/// Input image with `region` outlined.
fn region_overlay(image: &DynamicImage, region: Region) -> DynamicImage {
    let mut canvas = image.to_rgb8();
    for inset in 0..OVERLAY_THICKNESS {
        let width = region.width().saturating_sub(2 * inset);
        let height = region.height().saturating_sub(2 * inset);
        if width == 0 || height == 0 {
            break;
        }
        let (Ok(x), Ok(y)) = (
            i32::try_from(region.x() + inset),
            i32::try_from(region.y() + inset),
        ) else {
            break;
        };
        draw_hollow_rect_mut(&mut canvas, Rect::at(x, y).of_size(width, height), OVERLAY_COLOR);
    }
    DynamicImage::ImageRgb8(canvas)
}

fn encode_jpeg(image: &DynamicImage) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)?;
    Ok(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn options() -> ProcessingOptions {
        ProcessingOptions::builder()
            .question_count(5)
            .choice_labels(["A", "B", "C", "D"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.locator.score_kernel_divisor = 0;
        assert!(OmrEngine::new(config).is_err());
    }

    #[test]
    fn test_config_is_kept() {
        let config = EngineConfig {
            min_width: 640,
            min_height: 480,
            ..EngineConfig::default()
        };
        let engine = OmrEngine::new(config).unwrap();
        assert_eq!(engine.config().min_width, 640);
        assert_eq!(engine.config().min_height, 480);
    }

    #[test]
    fn test_reader_name() {
        let engine = OmrEngine::new(EngineConfig::default()).unwrap();
        assert_eq!(engine.name(), "omr-engine");
    }

    #[test]
    fn test_garbage_bytes_are_decode_error() {
        let engine = OmrEngine::new(EngineConfig::default()).unwrap();
        let err = engine.process(b"not an image", &options()).unwrap_err();
        assert!(matches!(err, OmrError::ImageDecode(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_small_image_rejected_before_processing() {
        let engine = OmrEngine::new(EngineConfig::default()).unwrap();
        let image = DynamicImage::new_luma8(640, 480);
        let err = engine.process_image(&image, &options()).unwrap_err();
        assert!(matches!(
            err,
            OmrError::ImageTooSmall {
                width: 640,
                height: 480,
                ..
            }
        ));
    }

    #[test]
    fn test_manual_region_outside_image_rejected() {
        let engine = OmrEngine::new(EngineConfig::default()).unwrap();
        let options = ProcessingOptions::builder()
            .question_count(5)
            .choice_labels(["A", "B", "C", "D"])
            .mode(DetectionMode::ManualRegion)
            .region(Region::new(700, 500, 200, 200).unwrap())
            .build()
            .unwrap();
        let image = DynamicImage::new_luma8(800, 600);
        let err = engine.process_image(&image, &options).unwrap_err();
        assert!(matches!(err, OmrError::InvalidRegion { .. }));
        assert!(err.is_validation());
    }

    #[test]
    fn test_overlay_outlines_region() {
        let image = DynamicImage::new_rgb8(50, 40);
        let region = Region::new(10, 5, 20, 15).unwrap();
        let overlay = region_overlay(&image, region).to_rgb8();
        assert_eq!(*overlay.get_pixel(10, 5), OVERLAY_COLOR);
        assert_eq!(*overlay.get_pixel(12, 7), OVERLAY_COLOR);
        assert_eq!(*overlay.get_pixel(13, 8), Rgb([0, 0, 0]));
        assert_eq!(*overlay.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_encode_jpeg_produces_jpeg() {
        let bytes = encode_jpeg(&DynamicImage::new_luma8(16, 16)).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
