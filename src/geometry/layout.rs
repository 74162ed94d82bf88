//! On-screen placement of the capture guide.

use super::{GuideRect, Size};
use serde::{Deserialize, Serialize};

/// Aspect ratio of an ID-1 card (85.60 x 53.98 mm), rounded as drawn on screen.
pub const ID_CARD_ASPECT: f64 = 1.58;

/// Layout of the capture screen.
///
/// The viewport is split into a guidance panel on top and a shutter bar of
/// `controls_height` below it. The guide spans `width_fraction` of the
/// panel's padded content width at card aspect ratio and is centered in
/// the panel. The defaults reproduce the phone-style preview: a 9:16
/// viewport, 32 px panel padding and a 160 px shutter bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideLayout {
    /// Viewport width in layout pixels.
    pub viewport_width: f64,
    /// Viewport height in layout pixels.
    pub viewport_height: f64,
    /// Padding on every side of the guidance panel.
    pub panel_padding: f64,
    /// Height of the shutter bar under the guidance panel.
    pub controls_height: f64,
    /// Guide width as a fraction of the panel's content width.
    pub width_fraction: f64,
    /// Guide width divided by guide height.
    pub aspect_ratio: f64,
}

impl Default for GuideLayout {
    fn default() -> Self {
        Self {
            viewport_width: 360.0,
            viewport_height: 640.0,
            panel_padding: 32.0,
            controls_height: 160.0,
            width_fraction: 0.98,
            aspect_ratio: ID_CARD_ASPECT,
        }
    }
}

impl GuideLayout {
    /// Displayed size of the video element.
    pub fn viewport(&self) -> Size {
        Size::new(self.viewport_width, self.viewport_height)
    }

    fn panel_height(&self) -> f64 {
        self.viewport_height - self.controls_height
    }

    fn content_width(&self) -> f64 {
        self.viewport_width - 2.0 * self.panel_padding
    }

    /// The guide box relative to the viewport's top-left corner.
    pub fn guide_rect(&self) -> GuideRect {
        let width = self.content_width() * self.width_fraction;
        let height = width / self.aspect_ratio;
        GuideRect::new(
            (self.viewport_width - width) / 2.0,
            (self.panel_height() - height) / 2.0,
            width,
            height,
        )
    }

    /// Checks that the layout describes a non-empty guide inside the panel.
    pub fn is_valid(&self) -> bool {
        let finite = [self.panel_padding, self.controls_height, self.aspect_ratio]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.viewport().is_usable()
            && self.panel_padding >= 0.0
            && self.controls_height >= 0.0
            && self.content_width() > 0.0
            && self.width_fraction > 0.0
            && self.width_fraction <= 1.0
            && self.aspect_ratio > 0.0
            && self.guide_rect().height <= self.panel_height() - 2.0 * self.panel_padding
    }
}
