//! Binary morphology with line-shaped structuring elements.
//!
//! Erosion treats pixels outside the image as foreground and dilation treats
//! them as background, so borders neither erode nor grow structures.

use image::{GrayImage, Luma};

use super::binarize::{BACKGROUND, FOREGROUND};

/// Orientation of a line structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAxis {
    /// A `length x 1` element (isolates horizontal lines).
    Horizontal,
    /// A `1 x length` element (isolates vertical lines).
    Vertical,
}

/// Morphological opening: `iterations` erosions followed by `iterations` dilations.
///
/// A `length` of 0 or 1 is the identity element.
#[must_use]
pub fn open_line(image: &GrayImage, axis: LineAxis, length: u32, iterations: u32) -> GrayImage {
    let mut result = image.clone();
    if length <= 1 {
        return result;
    }
    for _ in 0..iterations {
        result = sweep(&result, axis, length, Op::Erode);
    }
    for _ in 0..iterations {
        result = sweep(&result, axis, length, Op::Dilate);
    }
    result
}

/// Pixel-wise union of two binary images of equal size.
#[must_use]
pub fn union(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        let on = a.get_pixel(x, y).0[0] != BACKGROUND || b.get_pixel(x, y).0[0] != BACKGROUND;
        Luma([if on { FOREGROUND } else { BACKGROUND }])
    })
}

/// Pixel-wise difference `a \ b` of two binary images of equal size.
#[must_use]
pub fn subtract(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        let on = a.get_pixel(x, y).0[0] != BACKGROUND && b.get_pixel(x, y).0[0] == BACKGROUND;
        Luma([if on { FOREGROUND } else { BACKGROUND }])
    })
}

#[derive(Clone, Copy)]
enum Op {
    Erode,
    Dilate,
}

/// One erosion or dilation pass along `axis`.
///
/// Erosion's window for output index `i` covers `[i - anchor, i - anchor + length)`
/// with `anchor = length / 2`; dilation uses the reflected window so an opening
/// restores surviving structures exactly. A running count keeps each line O(n).
fn sweep(image: &GrayImage, axis: LineAxis, length: u32, op: Op) -> GrayImage {
    let (width, height) = image.dimensions();
    let (lines, span) = match axis {
        LineAxis::Horizontal => (height, width),
        LineAxis::Vertical => (width, height),
    };
    let at = |line: u32, i: u32| match axis {
        LineAxis::Horizontal => (i, line),
        LineAxis::Vertical => (line, i),
    };

    let len = i64::from(length);
    let anchor = match op {
        Op::Erode => len / 2,
        Op::Dilate => len - 1 - len / 2,
    };
    let span_i = i64::from(span);
    let mut out = GrayImage::new(width, height);
    let mut values = vec![false; span as usize];

    for line in 0..lines {
        for (i, v) in (0..span).zip(values.iter_mut()) {
            let (x, y) = at(line, i);
            *v = image.get_pixel(x, y).0[0] != BACKGROUND;
        }

        let is_on = |j: i64| -> bool {
            if (0..span_i).contains(&j) {
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                let idx = j as usize;
                values[idx]
            } else {
                matches!(op, Op::Erode)
            }
        };

        // Count of "on" samples in the window for i = 0.
        let mut count: i64 = (-anchor..len - anchor).filter(|&j| is_on(j)).count() as i64;

        for i in 0..span_i {
            let on = match op {
                Op::Erode => count == len,
                Op::Dilate => count > 0,
            };
            if on {
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                let (x, y) = at(line, i as u32);
                out.put_pixel(x, y, Luma([FOREGROUND]));
            }
            let leaving = i - anchor;
            let entering = i - anchor + len;
            count += i64::from(is_on(entering)) - i64::from(is_on(leaving));
        }
    }

    out
}
