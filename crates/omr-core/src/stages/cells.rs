//! Per-cell ink density over the question/choice grid.
//!
//! The region is cut into `question_count` equal rows and `labels + 1` equal
//! columns. Column 0 holds printed question numbers and is never measured.
//! Remainder pixels from integer division are left unassigned.

// Cell sizes are small; float conversions are exact and truncation is intended.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use image::GrayImage;

use super::binarize::BACKGROUND;
use crate::domain::DensityMap;

/// Configuration for cell measurement.
#[derive(Debug, Clone)]
pub struct CellConfig {
    /// Fraction of a cell's own size trimmed from each side before counting.
    pub inset_ratio: f64,
}

impl Default for CellConfig {
    fn default() -> Self {
        Self { inset_ratio: 0.05 }
    }
}

/// Pixel bounds of one measured cell, half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBounds {
    /// Left edge, inclusive.
    pub x0: u32,
    /// Top edge, inclusive.
    pub y0: u32,
    /// Right edge, exclusive.
    pub x1: u32,
    /// Bottom edge, exclusive.
    pub y1: u32,
}

impl CellBounds {
    /// Number of pixels covered, 0 when degenerate.
    #[must_use]
    pub const fn area(&self) -> u64 {
        let w = self.x1.saturating_sub(self.x0) as u64;
        let h = self.y1.saturating_sub(self.y0) as u64;
        w * h
    }
}

/// Measures ink density for every question and choice.
#[derive(Debug, Clone, Default)]
pub struct CellAnalyzer {
    config: CellConfig,
}

impl CellAnalyzer {
    /// Creates an analyzer with the given configuration.
    #[must_use]
    pub const fn new(config: CellConfig) -> Self {
        Self { config }
    }

    /// Returns one density map per question, in question order.
    #[must_use]
    pub fn analyze(
        &self,
        cleaned: &GrayImage,
        question_count: u32,
        labels: &[String],
    ) -> Vec<DensityMap> {
        (0..question_count)
            .map(|row| {
                labels
                    .iter()
                    .enumerate()
                    .map(|(col, label)| {
                        let bounds = self.cell_bounds(cleaned, question_count, labels.len(), row, col);
                        (label.clone(), density(cleaned, bounds))
                    })
                    .collect()
            })
            .collect()
    }

    /// Inset bounds of the cell for question `row` (0-based) and choice `choice` (0-based).
    #[must_use]
    pub fn cell_bounds(
        &self,
        cleaned: &GrayImage,
        question_count: u32,
        choice_count: usize,
        row: u32,
        choice: usize,
    ) -> CellBounds {
        let columns = u32::try_from(choice_count).unwrap_or(u32::MAX).saturating_add(1);
        let cell_h = cleaned.height() / question_count.max(1);
        let cell_w = cleaned.width() / columns;
        let column = u32::try_from(choice).unwrap_or(u32::MAX).saturating_add(1);

        let pad_y = (f64::from(cell_h) * self.config.inset_ratio) as u32;
        let pad_x = (f64::from(cell_w) * self.config.inset_ratio) as u32;

        let y0 = row * cell_h;
        let x0 = column * cell_w;
        CellBounds {
            x0: x0 + pad_x,
            y0: y0 + pad_y,
            x1: (x0 + cell_w).saturating_sub(pad_x),
            y1: (y0 + cell_h).saturating_sub(pad_y),
        }
    }
}

/// Foreground fraction inside `bounds`; 0.0 for an empty cell.
fn density(image: &GrayImage, bounds: CellBounds) -> f64 {
    let area = bounds.area();
    if area == 0 {
        return 0.0;
    }
    let mut ink = 0u64;
    for y in bounds.y0..bounds.y1 {
        for x in bounds.x0..bounds.x1 {
            if image.get_pixel(x, y).0[0] != BACKGROUND {
                ink += 1;
            }
        }
    }
    ink as f64 / area as f64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stages::binarize::FOREGROUND;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_default_config() {
        assert!((CellConfig::default().inset_ratio - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn test_one_map_per_question_in_label_order() {
        let img = GrayImage::new(500, 400);
        let maps = CellAnalyzer::default().analyze(&img, 4, &labels(&["A", "B", "C", "D"]));
        assert_eq!(maps.len(), 4);
        for map in &maps {
            let order: Vec<_> = map.iter().map(|(l, _)| l.to_string()).collect();
            assert_eq!(order, ["A", "B", "C", "D"]);
            assert!(map.iter().all(|(_, d)| d == 0.0));
        }
    }

    #[test]
    fn test_cell_bounds_skip_label_column_and_inset() {
        // 500 wide / 5 columns = 100; 400 tall / 4 rows = 100; inset 5px.
        let img = GrayImage::new(500, 400);
        let analyzer = CellAnalyzer::default();
        assert_eq!(
            analyzer.cell_bounds(&img, 4, 4, 0, 0),
            CellBounds {
                x0: 105,
                y0: 5,
                x1: 195,
                y1: 95
            }
        );
        assert_eq!(
            analyzer.cell_bounds(&img, 4, 4, 3, 3),
            CellBounds {
                x0: 405,
                y0: 305,
                x1: 495,
                y1: 395
            }
        );
    }

    #[test]
    fn test_filled_cell_density() {
        let mut img = GrayImage::new(500, 400);
        // Fill question 2, choice C completely.
        draw_filled_rect_mut(&mut img, Rect::at(300, 100).of_size(100, 100), Luma([FOREGROUND]));
        // Ink in the label column is ignored.
        draw_filled_rect_mut(&mut img, Rect::at(0, 100).of_size(100, 100), Luma([FOREGROUND]));

        let maps = CellAnalyzer::default().analyze(&img, 4, &labels(&["A", "B", "C", "D"]));
        assert!((maps[1].get("C").unwrap() - 1.0).abs() < f64::EPSILON);
        assert!(maps[1].get("A").unwrap().abs() < f64::EPSILON);
        assert!(maps[0].get("C").unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn test_residual_border_ink_inside_inset_ignored() {
        let mut img = GrayImage::new(500, 400);
        // 3px rule remnant on the top border of question 1, choice A.
        draw_filled_rect_mut(&mut img, Rect::at(100, 0).of_size(100, 3), Luma([FOREGROUND]));
        let maps = CellAnalyzer::default().analyze(&img, 4, &labels(&["A", "B", "C", "D"]));
        assert!(maps[0].get("A").unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn test_degenerate_cells_have_zero_density() {
        // Fewer rows than questions: every cell has zero height.
        let img = GrayImage::from_pixel(30, 3, Luma([FOREGROUND]));
        let maps = CellAnalyzer::default().analyze(&img, 10, &labels(&["A", "B"]));
        assert_eq!(maps.len(), 10);
        assert!(maps.iter().all(|m| m.iter().all(|(_, d)| d == 0.0)));
    }
}
