//! Synthetic answer sheets and binary images for testing.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use omr_core::Region;

const PAPER: Luma<u8> = Luma([255]);
const INK: Luma<u8> = Luma([0]);
const PENCIL: Luma<u8> = Luma([40]);
const ON: Luma<u8> = Luma([255]);

/// Builder for photographed-looking answer sheets.
///
/// Draws a white page with a ruled grid: one label column plus one column per
/// choice, one row per question. Marks are filled rectangles centered in their
/// cell.
///
/// # Example
///
/// ```
/// use omr_test_support::SyntheticSheetBuilder;
///
/// let sheet = SyntheticSheetBuilder::new(5, &["A", "B", "C", "D"])
///     .mark(1, "B")
///     .mark(3, "D")
///     .build();
/// assert_eq!(sheet.dimensions(), (1000, 800));
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticSheetBuilder {
    page: (u32, u32),
    grid: (u32, u32, u32, u32),
    line_thickness: u32,
    questions: u32,
    labels: Vec<String>,
    marks: Vec<(u32, usize, f64)>,
}

impl SyntheticSheetBuilder {
    /// Starts a 1000x800 page with a 700x600 grid at (150, 100).
    #[must_use]
    pub fn new(questions: u32, labels: &[&str]) -> Self {
        Self {
            page: (1000, 800),
            grid: (150, 100, 700, 600),
            line_thickness: 4,
            questions,
            labels: labels.iter().map(|l| (*l).to_string()).collect(),
            marks: Vec::new(),
        }
    }

    /// Sets the page size.
    #[must_use]
    pub const fn page_size(mut self, width: u32, height: u32) -> Self {
        self.page = (width, height);
        self
    }

    /// Sets the outer bounds of the ruled grid.
    #[must_use]
    pub const fn grid(mut self, x: u32, y: u32, width: u32, height: u32) -> Self {
        self.grid = (x, y, width, height);
        self
    }

    /// Fills most of the cell for `question` (1-based) and `label`.
    ///
    /// Unknown labels are ignored.
    #[must_use]
    pub fn mark(self, question: u32, label: &str) -> Self {
        self.mark_sized(question, label, 0.45)
    }

    /// Marks a cell with a rectangle of `fraction` of the cell size.
    #[must_use]
    pub fn mark_sized(mut self, question: u32, label: &str, fraction: f64) -> Self {
        if let Some(index) = self.labels.iter().position(|l| l == label) {
            self.marks.push((question, index, fraction));
        }
        self
    }

    /// Region covered by the grid.
    ///
    /// # Panics
    ///
    /// Panics if the grid has zero width or height.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn grid_region(&self) -> Region {
        let (x, y, w, h) = self.grid;
        Region::new(x, y, w, h).unwrap()
    }

    /// Renders the sheet.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    pub fn build(&self) -> GrayImage {
        let (page_w, page_h) = self.page;
        let (gx, gy, gw, gh) = self.grid;
        let t = self.line_thickness;
        let mut img = GrayImage::from_pixel(page_w, page_h, PAPER);

        let columns = self.labels.len() as u32 + 1;
        let rows = self.questions.max(1);
        let cell_w = gw / columns;
        let cell_h = gh / rows;

        // Row rules including top and bottom borders.
        for r in 0..=rows {
            let y = if r == rows { gy + gh - t } else { gy + r * cell_h };
            fill(&mut img, gx, y, gw, t, INK);
        }
        // Column rules including left and right borders.
        for c in 0..=columns {
            let x = if c == columns { gx + gw - t } else { gx + c * cell_w };
            fill(&mut img, x, gy, t, gh, INK);
        }

        for &(question, index, fraction) in &self.marks {
            if question == 0 || question > rows {
                continue;
            }
            let mark_w = (f64::from(cell_w) * fraction) as u32;
            let mark_h = (f64::from(cell_h) * fraction) as u32;
            let cx = gx + (index as u32 + 1) * cell_w + cell_w / 2;
            let cy = gy + (question - 1) * cell_h + cell_h / 2;
            fill(&mut img, cx - mark_w / 2, cy - mark_h / 2, mark_w, mark_h, PENCIL);
        }

        img
    }

    /// Renders and encodes the sheet as PNG.
    #[must_use]
    pub fn png_bytes(&self) -> Vec<u8> {
        encode(&self.build(), ImageFormat::Png)
    }

    /// Renders and encodes the sheet as JPEG.
    #[must_use]
    pub fn jpeg_bytes(&self) -> Vec<u8> {
        encode(&self.build(), ImageFormat::Jpeg)
    }

    /// Renders and encodes the sheet as lossless WebP.
    #[must_use]
    pub fn webp_bytes(&self) -> Vec<u8> {
        encode(&self.build(), ImageFormat::WebP)
    }
}

/// Builder for binary (0/255) test images.
///
/// # Example
///
/// ```
/// use omr_test_support::SyntheticBinaryBuilder;
///
/// let binary = SyntheticBinaryBuilder::new(400, 300)
///     .hollow_rect(10, 10, 180, 130, 3)
///     .ruled_rect(210, 140, 180, 150, 3, 5, 4)
///     .build();
/// assert_eq!(binary.dimensions(), (400, 300));
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticBinaryBuilder {
    image: GrayImage,
}

impl SyntheticBinaryBuilder {
    /// Starts an all-background canvas.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    /// Adds a solid rectangle.
    #[must_use]
    pub fn filled_rect(mut self, x: u32, y: u32, width: u32, height: u32) -> Self {
        fill(&mut self.image, x, y, width, height, ON);
        self
    }

    /// Adds a rectangle outline `thickness` pixels wide.
    #[must_use]
    pub fn hollow_rect(mut self, x: u32, y: u32, width: u32, height: u32, thickness: u32) -> Self {
        let t = thickness.min(width).min(height);
        fill(&mut self.image, x, y, width, t, ON);
        fill(&mut self.image, x, y + height - t, width, t, ON);
        fill(&mut self.image, x, y, t, height, ON);
        fill(&mut self.image, x + width - t, y, t, height, ON);
        self
    }

    /// Adds an outline divided into `rows` x `columns` cells by interior rules.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn ruled_rect(
        mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        thickness: u32,
        rows: u32,
        columns: u32,
    ) -> Self {
        self = self.hollow_rect(x, y, width, height, thickness);
        for r in 1..rows {
            fill(&mut self.image, x, y + height * r / rows, width, thickness, ON);
        }
        for c in 1..columns {
            fill(&mut self.image, x + width * c / columns, y, thickness, height, ON);
        }
        self
    }

    /// Returns the image.
    #[must_use]
    pub fn build(self) -> GrayImage {
        self.image
    }
}

#[allow(clippy::cast_possible_wrap)]
fn fill(img: &mut GrayImage, x: u32, y: u32, width: u32, height: u32, color: Luma<u8>) {
    if width == 0 || height == 0 {
        return;
    }
    draw_filled_rect_mut(img, Rect::at(x as i32, y as i32).of_size(width, height), color);
}

// In-memory encoding of an 8-bit RGB image does not fail.
#[allow(clippy::unwrap_used)]
fn encode(image: &GrayImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(DynamicImage::ImageLuma8(image.clone()).to_rgb8())
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}
