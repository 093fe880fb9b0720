//! Contour helpers: external contours, quadrilateral approximation, bounds.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;

/// Axis-aligned bounding box in pixel coordinates (inclusive of both ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Outer borders of top-level foreground components.
#[must_use]
pub fn external_contours(binary: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
        .map(|c| c.points)
        .filter(|points| !points.is_empty())
        .collect()
}

/// Douglas-Peucker approximation of a closed contour, kept only when it has
/// exactly four vertices.
///
/// The tolerance is `epsilon_ratio` of the contour perimeter.
#[must_use]
pub fn approximate_quadrilateral(
    contour: &[Point<i32>],
    epsilon_ratio: f64,
) -> Option<Vec<Point<i32>>> {
    if contour.len() < 4 {
        return None;
    }
    let epsilon = epsilon_ratio * arc_length(contour, true);
    if epsilon <= 0.0 {
        return None;
    }
    let approx = approximate_polygon_dp(contour, epsilon, true);
    (approx.len() == 4).then_some(approx)
}

/// Bounding box of a point set.
#[must_use]
pub fn bounding_box(points: &[Point<i32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingBox {
        x: u32::try_from(min_x).ok()?,
        y: u32::try_from(min_y).ok()?,
        width: u32::try_from(max_x - min_x + 1).ok()?,
        height: u32::try_from(max_y - min_y + 1).ok()?,
    })
}
