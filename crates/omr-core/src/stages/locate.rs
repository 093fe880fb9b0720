//! Answer-grid region search.
//!
//! Candidates come from external contours: large four-sided outlines are
//! scored by how much horizontal and vertical rule-line ink they contain, and
//! the best one wins. When no outline is four-sided, the bounding box of the
//! largest contour is used instead.

use image::imageops;
use image::GrayImage;
use imageproc::geometry::contour_area;
use tracing::debug;

use super::binarize::count_foreground;
use super::contour::{approximate_quadrilateral, bounding_box, external_contours};
use super::morphology::{open_line, LineAxis};
use crate::domain::{DetectionMode, ProcessingOptions, Region};
use crate::error::{OmrError, Result};

/// Configuration for region search.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Contours enclosing less than this fraction of the image are ignored.
    pub min_area_ratio: f64,
    /// Polygon approximation tolerance as a fraction of contour perimeter.
    pub poly_epsilon: f64,
    /// Rule-line element length is the candidate side divided by this.
    pub score_kernel_divisor: u32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            min_area_ratio: 0.10,
            poly_epsilon: 0.02,
            score_kernel_divisor: 10,
        }
    }
}

/// How a candidate region was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// Bounding box of a large four-sided contour.
    Quadrilateral,
    /// Bounding box of the largest contour, used when no quadrilateral exists.
    LargestContourFallback,
}

/// A candidate region with its grid score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredCandidate {
    /// Origin of the candidate.
    pub kind: CandidateKind,
    /// Candidate bounds.
    pub region: Region,
    /// Rule-line foreground count. Always 0 for the fallback.
    pub score: u64,
}

/// Finds the answer grid in a binary image.
#[derive(Debug, Clone, Default)]
pub struct RegionLocator {
    config: LocatorConfig,
}

impl RegionLocator {
    /// Creates a locator with the given configuration.
    #[must_use]
    pub const fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    /// Returns the grid region for `binary`.
    ///
    /// Manual mode returns the caller's region unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`OmrError::GridNotFound`] when automatic search finds no
    /// contour at all.
    pub fn locate(&self, binary: &GrayImage, options: &ProcessingOptions) -> Result<Region> {
        match options.mode() {
            DetectionMode::ManualRegion => options
                .region()
                .ok_or_else(|| OmrError::invalid("manual region mode requires a region")),
            DetectionMode::Auto => self.search(binary),
        }
    }

    /// Automatic search over all candidates.
    ///
    /// # Errors
    ///
    /// Returns [`OmrError::GridNotFound`] when the image has no contours.
    pub fn search(&self, binary: &GrayImage) -> Result<Region> {
        let candidates = self.candidates(binary)?;
        let best = select(candidates).ok_or_else(|| {
            OmrError::GridNotFound(format!(
                "no contours in {}x{} binary image",
                binary.width(),
                binary.height()
            ))
        })?;

        debug!(
            "Selected {:?} region {} (score {})",
            best.kind, best.region, best.score
        );
        Ok(best.region)
    }

    /// Enumerates scored candidates.
    ///
    /// Returns the quadrilateral candidates when there are any, otherwise a
    /// single fallback candidate, otherwise nothing.
    ///
    /// # Errors
    ///
    /// Propagates region construction failures (not expected for traced contours).
    pub fn candidates(&self, binary: &GrayImage) -> Result<Vec<ScoredCandidate>> {
        let contours = external_contours(binary);
        let min_area = f64::from(binary.width())
            * f64::from(binary.height())
            * self.config.min_area_ratio;

        let mut quads = Vec::new();
        for contour in &contours {
            if contour_area(contour).abs() < min_area {
                continue;
            }
            let Some(bbox) = approximate_quadrilateral(contour, self.config.poly_epsilon)
                .and_then(|quad| bounding_box(&quad))
            else {
                continue;
            };
            let region = Region::new(bbox.x, bbox.y, bbox.width, bbox.height)?;
            let score = self.grid_score(binary, region);
            debug!("Quadrilateral candidate {region} scored {score}");
            quads.push(ScoredCandidate {
                kind: CandidateKind::Quadrilateral,
                region,
                score,
            });
        }

        if !quads.is_empty() {
            return Ok(quads);
        }

        // First contour wins on equal area.
        let mut fallback: Option<(&[_], f64)> = None;
        for contour in &contours {
            let area = contour_area(contour).abs();
            if !matches!(fallback, Some((_, best)) if area <= best) {
                fallback = Some((contour.as_slice(), area));
            }
        }

        match fallback.and_then(|(contour, _)| bounding_box(contour)) {
            Some(bbox) => {
                let region = Region::new(bbox.x, bbox.y, bbox.width, bbox.height)?;
                debug!("No quadrilateral contour, falling back to largest contour {region}");
                Ok(vec![ScoredCandidate {
                    kind: CandidateKind::LargestContourFallback,
                    region,
                    score: 0,
                }])
            }
            None => Ok(Vec::new()),
        }
    }

    /// Rule-line ink inside `region`: foreground surviving a horizontal
    /// opening plus foreground surviving a vertical opening.
    #[must_use]
    pub fn grid_score(&self, binary: &GrayImage, region: Region) -> u64 {
        let window = extract_region(binary, region);
        let divisor = self.config.score_kernel_divisor.max(1);
        let horizontal = open_line(
            &window,
            LineAxis::Horizontal,
            (region.width() / divisor).max(1),
            1,
        );
        let vertical = open_line(
            &window,
            LineAxis::Vertical,
            (region.height() / divisor).max(1),
            1,
        );
        count_foreground(&horizontal) + count_foreground(&vertical)
    }
}

/// Highest score wins; the earliest candidate wins ties.
fn select(candidates: Vec<ScoredCandidate>) -> Option<ScoredCandidate> {
    candidates
        .into_iter()
        .reduce(|best, next| if next.score > best.score { next } else { best })
}

/// Copies `region` out of `image`.
#[must_use]
pub fn extract_region(image: &GrayImage, region: Region) -> GrayImage {
    imageops::crop_imm(image, region.x(), region.y(), region.width(), region.height()).to_image()
}
