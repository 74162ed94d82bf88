//! Frame type representing a captured video frame with metadata.

use super::CameraError;
use crate::geometry::PixelRect;
use image::RgbImage;
use std::time::Instant;

/// A single frame grabbed from the live stream.
///
/// Pixels are packed RGB8, row-major, at the stream's native resolution.
#[derive(Clone)]
pub struct Frame {
    /// Raw RGB pixel data.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Capture timestamp.
    timestamp: Instant,
    /// Monotonic sequence number.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == (self.width as usize) * (self.height as usize) * 3
    }

    /// Cuts `rect` out of the frame as an owned image.
    pub fn crop(&self, rect: &PixelRect) -> Result<RgbImage, CameraError> {
        if !self.is_valid() {
            return Err(CameraError::CaptureFailed(
                "frame buffer does not match its dimensions".into(),
            ));
        }
        let overflows = |origin: u32, extent: u32, limit: u32| {
            origin.checked_add(extent).map_or(true, |end| end > limit)
        };
        if rect.width == 0
            || rect.height == 0
            || overflows(rect.x, rect.width, self.width)
            || overflows(rect.y, rect.height, self.height)
        {
            return Err(CameraError::CaptureFailed(format!(
                "crop {:?} outside {}x{} frame",
                rect, self.width, self.height
            )));
        }

        let stride = self.width as usize * 3;
        let row_bytes = rect.width as usize * 3;
        let mut cropped = Vec::with_capacity(row_bytes * rect.height as usize);
        for row in rect.y..rect.y + rect.height {
            let start = row as usize * stride + rect.x as usize * 3;
            cropped.extend_from_slice(&self.pixels[start..start + row_bytes]);
        }

        RgbImage::from_raw(rect.width, rect.height, cropped)
            .ok_or_else(|| CameraError::CaptureFailed("cropped buffer size mismatch".into()))
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}
