//! Plain geometric value types shared by the mapper and the capture path.

use serde::{Deserialize, Serialize};

/// Width and height of a box, in layout pixels or source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Creates a new size.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size of a source with integer pixel dimensions.
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }

    /// Returns true if both dimensions are finite and strictly positive.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// The guide rectangle, relative to the top-left corner of the video element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuideRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl GuideRect {
    /// Creates a guide rectangle from its origin and size.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A guide covering the whole element.
    pub fn covering(display: Size) -> Self {
        Self::new(0.0, 0.0, display.width, display.height)
    }
}

/// A crop rectangle in source pixel space.
///
/// Produced per capture by [`map_guide_to_source`](super::map_guide_to_source)
/// and consumed immediately to cut the captured image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Snaps the region to whole pixels inside a `source_width` x `source_height` frame.
    ///
    /// The origin is floored, the size rounded, and the result always holds at
    /// least one pixel without reaching past the frame edges. Returns `None`
    /// only for an empty frame.
    pub fn to_pixel_rect(&self, source_width: u32, source_height: u32) -> Option<PixelRect> {
        if source_width == 0 || source_height == 0 {
            return None;
        }

        let x = snap_origin(self.x, source_width);
        let y = snap_origin(self.y, source_height);
        let width = snap_extent(self.width, source_width - x);
        let height = snap_extent(self.height, source_height - y);

        Some(PixelRect {
            x,
            y,
            width,
            height,
        })
    }
}

fn snap_origin(value: f64, limit: u32) -> u32 {
    // `as` saturates, so negatives land on 0
    (value.floor() as u32).min(limit - 1)
}

fn snap_extent(value: f64, available: u32) -> u32 {
    (value.round() as u32).clamp(1, available)
}

/// An integer pixel rectangle, ready for cropping a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}
