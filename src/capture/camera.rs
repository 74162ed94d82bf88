//! Camera abstraction for live document capture.
//!
//! The camera is an external streaming resource: it is acquired when the
//! capture screen opens and must be released exactly once when it closes.

use super::{CaptureConfig, FacingMode, Frame};
use thiserror::Error;

/// Errors that can occur during camera operations.
///
/// The first five variants are the acquisition categories shown to the
/// user, each with its own remediation message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CameraError {
    #[error("camera access requires a secure context")]
    SecureContextRequired,
    #[error("camera access is not supported on this platform")]
    UnsupportedBrowser,
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("camera device not found")]
    DeviceNotFound,
    #[error("camera error: {0}")]
    Unknown(String),
    #[error("camera not acquired")]
    NotAcquired,
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
}

impl CameraError {
    /// The message shown on the capture screen for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::SecureContextRequired => {
                "Camera access requires a secure connection (HTTPS). Please check your URL."
            }
            Self::UnsupportedBrowser => "Your browser does not support camera access.",
            Self::PermissionDenied => {
                "Camera access was denied. Please enable it in your browser settings."
            }
            Self::DeviceNotFound => "No camera found on this device.",
            Self::Unknown(_) | Self::NotAcquired | Self::CaptureFailed(_) => {
                "Could not access camera. Please refresh and try again."
            }
        }
    }

    /// Returns true for errors raised while acquiring the stream.
    pub fn is_acquisition_error(&self) -> bool {
        !matches!(self, Self::NotAcquired | Self::CaptureFailed(_))
    }
}

/// Observable outcome of a camera acquisition.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionState {
    /// Acquisition requested, waiting on the device or permission prompt.
    Pending,
    /// Stream is live at the given native resolution.
    Granted { width: u32, height: u32 },
    /// Acquisition failed; the user may retry.
    Denied(CameraError),
}

impl AcquisitionState {
    /// Returns true if the stream is live.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }
}

/// Trait for camera implementations.
///
/// This abstraction allows swapping between real camera hardware
/// and mock implementations for testing.
pub trait Camera {
    /// Acquires the stream with the given configuration.
    fn acquire(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Grabs the current frame of the live stream.
    fn frame(&mut self) -> Result<Frame, CameraError>;

    /// Native resolution of the stream, once acquired.
    fn resolution(&self) -> Option<(u32, u32)>;

    /// Checks if a stream is currently held.
    fn is_active(&self) -> bool;

    /// Stops the stream and releases the device.
    fn release(&mut self);
}

impl<C: Camera + ?Sized> Camera for Box<C> {
    fn acquire(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        (**self).acquire(config)
    }

    fn frame(&mut self) -> Result<Frame, CameraError> {
        (**self).frame()
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        (**self).resolution()
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Mock camera for testing that generates synthetic frames.
///
/// Acquisition can be scripted to fail, and acquire/release calls are
/// counted so tests can detect leaked streams.
#[derive(Debug, Default)]
pub struct MockCamera {
    resolution: Option<(u32, u32)>,
    facing: Option<FacingMode>,
    sequence: u64,
    fail_with: Option<CameraError>,
    acquisitions: u32,
    releases: u32,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// A camera whose acquisitions fail with `error` until [`clear_failure`](Self::clear_failure).
    pub fn failing(error: CameraError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    /// Lets subsequent acquisitions succeed.
    pub fn clear_failure(&mut self) {
        self.fail_with = None;
    }

    /// Number of successful acquisitions.
    pub fn acquisitions(&self) -> u32 {
        self.acquisitions
    }

    /// Number of releases of a held stream.
    pub fn releases(&self) -> u32 {
        self.releases
    }

    /// Facing mode of the held stream.
    pub fn facing(&self) -> Option<FacingMode> {
        self.facing
    }
}

impl Camera for MockCamera {
    fn acquire(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        if let Some(error) = &self.fail_with {
            tracing::info!(error = %error, "MockCamera acquisition refused");
            return Err(error.clone());
        }
        config
            .validate()
            .map_err(|e| CameraError::Unknown(e.to_string()))?;
        config.check_context()?;

        if self.resolution.is_some() {
            tracing::warn!("MockCamera acquired twice without release");
        }
        self.resolution = Some((config.ideal_width, config.ideal_height));
        self.facing = Some(config.facing);
        self.sequence = 0;
        self.acquisitions += 1;
        tracing::info!(
            width = config.ideal_width,
            height = config.ideal_height,
            facing = ?config.facing,
            "MockCamera acquired"
        );
        Ok(())
    }

    fn frame(&mut self) -> Result<Frame, CameraError> {
        let (width, height) = self.resolution.ok_or(CameraError::NotAcquired)?;

        // Gradient pattern shifted by sequence so consecutive frames differ
        let shift = self.sequence as u32;
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x + shift) % 256) as u8);
                pixels.push((y % 256) as u8);
                pixels.push(((x ^ y) % 256) as u8);
            }
        }

        self.sequence += 1;
        Ok(Frame::new(pixels, width, height, self.sequence))
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        self.resolution
    }

    fn is_active(&self) -> bool {
        self.resolution.is_some()
    }

    fn release(&mut self) {
        self.facing = None;
        if self.resolution.take().is_some() {
            self.releases += 1;
            tracing::info!("MockCamera released");
        }
    }
}
