//! Guide-to-source coordinate mapping under cover fit.
//!
//! A preview element showing the video with `object-fit: cover` scales the
//! source uniformly until it fills the element, then centers it and clips
//! whatever overflows. Mapping the on-screen guide back into the source is
//! the inverse of that transform, followed by clamping to the source bounds.

use super::{CropRegion, GuideRect, Size};
use thiserror::Error;

/// Errors produced by the geometry mapper.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// The guide box lies entirely outside the visible source.
    #[error("guide rectangle does not overlap the video source")]
    NoCropRegion,
    /// The display or source reported an empty or non-finite size.
    #[error("invalid dimensions: display {display:?}, source {source_size:?}")]
    InvalidDimensions { display: Size, source_size: Size },
}

/// The transform applied by a cover-fit preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFit {
    /// Uniform scale from source pixels to layout pixels.
    pub scale: f64,
    /// Size of the scaled source, possibly larger than the display.
    pub rendered: Size,
    /// Position of the scaled source's top-left corner inside the display.
    /// Negative on an axis where the source overflows.
    pub offset_x: f64,
    pub offset_y: f64,
}

impl CoverFit {
    /// Computes the cover-fit transform of `source` into `display`.
    pub fn new(display: Size, source: Size) -> Result<Self, GeometryError> {
        if !display.is_usable() || !source.is_usable() {
            return Err(GeometryError::InvalidDimensions {
                display,
                source_size: source,
            });
        }

        let scale = (display.width / source.width).max(display.height / source.height);
        let rendered = Size::new(source.width * scale, source.height * scale);

        Ok(Self {
            scale,
            rendered,
            offset_x: (display.width - rendered.width) / 2.0,
            offset_y: (display.height - rendered.height) / 2.0,
        })
    }

    /// Maps a layout-space rectangle into source space without clamping.
    pub fn unproject(&self, guide: &GuideRect) -> CropRegion {
        CropRegion {
            x: (guide.x - self.offset_x) / self.scale,
            y: (guide.y - self.offset_y) / self.scale,
            width: guide.width / self.scale,
            height: guide.height / self.scale,
        }
    }
}

/// Converts a guide rectangle drawn over a cover-fit video element into the
/// matching crop rectangle of the native video frame.
///
/// `display` is the element's layout size, `source` the native resolution,
/// and `guide` is relative to the element's top-left corner. Parts of the
/// region outside the source are clipped off, keeping the far edge in place
/// when the near edge is clipped.
///
/// # Errors
///
/// [`GeometryError::NoCropRegion`] if nothing remains after clipping, and
/// [`GeometryError::InvalidDimensions`] if either size is empty.
pub fn map_guide_to_source(
    display: Size,
    source: Size,
    guide: GuideRect,
) -> Result<CropRegion, GeometryError> {
    let fit = CoverFit::new(display, source)?;
    let raw = fit.unproject(&guide);

    let (x, width) = clamp_axis(raw.x, raw.width, source.width);
    let (y, height) = clamp_axis(raw.y, raw.height, source.height);

    // NaN guides fall through here as well
    if !(width > 0.0 && height > 0.0) {
        tracing::debug!(?guide, ?raw, "Guide maps outside the source");
        return Err(GeometryError::NoCropRegion);
    }

    Ok(CropRegion {
        x,
        y,
        width,
        height,
    })
}

fn clamp_axis(mut origin: f64, mut extent: f64, limit: f64) -> (f64, f64) {
    if origin < 0.0 {
        extent += origin;
        origin = 0.0;
    }
    if origin > limit {
        origin = limit;
    }
    if origin + extent > limit {
        extent = limit - origin;
    }
    (origin, extent)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_cover_fit_overflows_wider_axis() {
        // 1280x720 landscape source in a 360x640 portrait element
        let fit = CoverFit::new(Size::new(360.0, 640.0), Size::new(1280.0, 720.0)).unwrap();
        assert!((fit.scale - 640.0 / 720.0).abs() < EPS);
        assert!(fit.offset_x < 0.0);
        assert!(fit.offset_y.abs() < EPS);
    }

    #[test]
    fn test_full_guide_matching_aspect_is_full_source() {
        let display = Size::new(320.0, 180.0);
        let source = Size::new(1280.0, 720.0);
        let region = map_guide_to_source(display, source, GuideRect::covering(display)).unwrap();

        assert!(region.x.abs() < EPS);
        assert!(region.y.abs() < EPS);
        assert!((region.width - 1280.0).abs() < EPS);
        assert!((region.height - 720.0).abs() < EPS);
    }

    #[test]
    fn test_full_guide_mismatched_aspect_is_visible_center() {
        // Source is square, element is twice as tall as wide: sides are clipped.
        let display = Size::new(100.0, 200.0);
        let source = Size::new(400.0, 400.0);
        let region = map_guide_to_source(display, source, GuideRect::covering(display)).unwrap();

        assert!((region.x - 100.0).abs() < EPS);
        assert!(region.y.abs() < EPS);
        assert!((region.width - 200.0).abs() < EPS);
        assert!((region.height - 400.0).abs() < EPS);
    }

    #[test]
    fn test_clamp_left_edge_keeps_far_edge() {
        // scale 2.0, rendered 200x200 centered in 160x200 -> offset_x = -20
        let display = Size::new(160.0, 200.0);
        let source = Size::new(100.0, 100.0);
        let guide = GuideRect::new(-30.0, 50.0, 100.0, 50.0);

        let fit = CoverFit::new(display, source).unwrap();
        assert!((fit.scale - 2.0).abs() < EPS);
        let raw = fit.unproject(&guide);

        let region = map_guide_to_source(display, source, guide).unwrap();
        assert_eq!(region.x, 0.0);
        assert!((raw.width - region.width - 10.0 / 2.0).abs() < EPS);
        assert!((region.right() - raw.right()).abs() < EPS);
        assert!((region.y - 25.0).abs() < EPS);
    }

    #[test]
    fn test_clamp_far_edges() {
        let display = Size::new(100.0, 100.0);
        let source = Size::new(50.0, 50.0);
        let guide = GuideRect::new(60.0, 80.0, 80.0, 40.0);

        let region = map_guide_to_source(display, source, guide).unwrap();
        assert!((region.x - 30.0).abs() < EPS);
        assert!((region.width - 20.0).abs() < EPS);
        assert!((region.y - 40.0).abs() < EPS);
        assert!((region.height - 10.0).abs() < EPS);
    }

    #[test]
    fn test_guide_outside_source_fails() {
        let display = Size::new(100.0, 100.0);
        let source = Size::new(100.0, 100.0);

        let left = GuideRect::new(-50.0, 10.0, 40.0, 40.0);
        assert_eq!(
            map_guide_to_source(display, source, left),
            Err(GeometryError::NoCropRegion)
        );

        let below = GuideRect::new(10.0, 150.0, 40.0, 40.0);
        assert_eq!(
            map_guide_to_source(display, source, below),
            Err(GeometryError::NoCropRegion)
        );
    }

    #[test]
    fn test_zero_sized_guide_fails() {
        let display = Size::new(100.0, 100.0);
        let guide = GuideRect::new(10.0, 10.0, 0.0, 20.0);
        assert_eq!(
            map_guide_to_source(display, display, guide),
            Err(GeometryError::NoCropRegion)
        );
    }

    #[test]
    fn test_unready_video_rejected() {
        let result = map_guide_to_source(
            Size::new(360.0, 640.0),
            Size::new(0.0, 0.0),
            GuideRect::new(0.0, 0.0, 10.0, 10.0),
        );
        assert!(matches!(result, Err(GeometryError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_deterministic() {
        let display = Size::new(360.0, 640.0);
        let source = Size::new(1280.0, 720.0);
        let guide = GuideRect::new(3.6, 206.0, 352.8, 223.3);
        assert_eq!(
            map_guide_to_source(display, source, guide),
            map_guide_to_source(display, source, guide)
        );
    }
}
