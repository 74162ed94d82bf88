//! Camera capture configuration.
//!
//! The stream is requested with ideal constraints; the device may deliver
//! a different native resolution, which the crop mapping handles.

use super::CameraError;
use crate::geometry::GuideLayout;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest accepted ideal frame edge, in pixels.
pub const MAX_FRAME_DIMENSION: u32 = 8192;

/// Which camera to prefer on devices with more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera, pointed at the document.
    #[default]
    Environment,
    /// Front camera.
    User,
}

/// Configuration for camera capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index.
    pub device_id: u32,
    /// Requested frame width in pixels.
    pub ideal_width: u32,
    /// Requested frame height in pixels.
    pub ideal_height: u32,
    /// Preferred camera. Desktop capture backends enumerate devices by
    /// index and have no facing, so there it is only reported in logs.
    pub facing: FacingMode,
    /// JPEG quality for captured crops (1-100).
    pub jpeg_quality: u8,
    /// Refuse to open the camera outside a secure context.
    pub require_secure_context: bool,
    /// Whether the hosting context is secure (HTTPS or localhost).
    pub secure_context: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            ideal_width: 1280,
            ideal_height: 720,
            facing: FacingMode::Environment,
            jpeg_quality: 90,
            require_secure_context: true,
            secure_context: true,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            ideal_width: width,
            ideal_height: height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_range = |edge: u32| (1..=MAX_FRAME_DIMENSION).contains(&edge);
        if !in_range(self.ideal_width) || !in_range(self.ideal_height) {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ConfigError::InvalidQuality(self.jpeg_quality));
        }
        Ok(())
    }

    /// Fails when a secure context is required but missing.
    pub fn check_context(&self) -> Result<(), CameraError> {
        if self.require_secure_context && !self.secure_context {
            return Err(CameraError::SecureContextRequired);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    #[error("invalid JPEG quality {0} (must be 1-100)")]
    InvalidQuality(u8),
    #[error("invalid guide layout")]
    InvalidGuide,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub guide: GuideLayout,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print submissions.
    pub pretty: bool,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            metrics_port: 0,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.capture.validate()?;
        if !config.guide.is_valid() {
            return Err(ConfigError::InvalidGuide);
        }
        Ok(config)
    }
}
