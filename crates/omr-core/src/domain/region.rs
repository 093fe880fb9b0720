//! Axis-aligned answer-grid region.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OmrError, Result};

/// Rectangular sub-area of an image, in pixel coordinates.
///
/// Width and height are always positive; construction rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRegion", into = "RawRegion")]
pub struct Region {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

#[derive(Serialize, Deserialize)]
struct RawRegion {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Region {
    /// Creates a region, rejecting zero width or height.
    ///
    /// # Errors
    ///
    /// Returns [`OmrError::InvalidOptions`] if `width` or `height` is zero.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(OmrError::invalid(format!(
                "region must have positive size, got {width}x{height}"
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Left edge.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Top edge.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Area in pixels.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns true if the region lies entirely inside an image of the given size.
    #[must_use]
    pub const fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.x, self.y
        )
    }
}

impl TryFrom<RawRegion> for Region {
    type Error = OmrError;

    fn try_from(raw: RawRegion) -> Result<Self> {
        Self::new(raw.x, raw.y, raw.width, raw.height)
    }
}

impl From<Region> for RawRegion {
    fn from(region: Region) -> Self {
        Self {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
        }
    }
}
