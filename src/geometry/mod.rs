//! Viewport-to-source coordinate mapping.
//!
//! The capture screen shows the live video with cover fit and draws a guide
//! box over it. Only the guided region is kept, so every capture needs the
//! guide translated from layout pixels into native frame pixels. Everything
//! here is a pure function of numeric inputs and never touches a device.

mod layout;
mod mapper;
mod rect;

pub use layout::{GuideLayout, ID_CARD_ASPECT};
pub use mapper::{map_guide_to_source, CoverFit, GeometryError};
pub use rect::{CropRegion, GuideRect, PixelRect, Size};
