//! Camera input and frame handling.
//!
//! This module provides the camera source used on the capture screen: a
//! trait over live streams, the acquisition outcomes the user sees, and
//! the frame type that gets cropped to the guide region.

mod camera;
mod config;
mod frame;
#[cfg(feature = "camera")]
mod native;

pub use camera::{AcquisitionState, Camera, CameraError, MockCamera};
pub use config::{
    CaptureConfig, ConfigError, FacingMode, FileConfig, OutputConfig, MAX_FRAME_DIMENSION,
};
pub use frame::Frame;
#[cfg(feature = "camera")]
pub use native::NativeCamera;
