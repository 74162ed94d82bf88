//! Hardware camera backed by nokhwa.

use super::{Camera, CameraError, CaptureConfig, Frame};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::NokhwaError;

/// A physical camera opened through the platform's native capture API.
#[derive(Default)]
pub struct NativeCamera {
    inner: Option<nokhwa::Camera>,
    sequence: u64,
}

impl NativeCamera {
    pub fn new() -> Self {
        Self::default()
    }
}

fn map_error(error: NokhwaError) -> CameraError {
    match error {
        NokhwaError::OpenDeviceError(device, reason) => {
            if is_permission_failure(&reason) {
                CameraError::PermissionDenied
            } else {
                tracing::debug!(%device, %reason, "Camera device open failed");
                CameraError::DeviceNotFound
            }
        }
        NokhwaError::OpenStreamError(reason) if is_permission_failure(&reason) => {
            CameraError::PermissionDenied
        }
        NokhwaError::UnsupportedOperationError(_) | NokhwaError::NotImplementedError(_) => {
            CameraError::UnsupportedBrowser
        }
        other => CameraError::Unknown(other.to_string()),
    }
}

fn is_permission_failure(reason: &str) -> bool {
    let reason = reason.to_ascii_lowercase();
    reason.contains("permission") || reason.contains("denied") || reason.contains("not authorized")
}

impl Camera for NativeCamera {
    fn acquire(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::Unknown(e.to_string()))?;
        config.check_context()?;

        if self.inner.is_some() {
            tracing::warn!("Native camera acquired twice; releasing previous stream");
            self.release();
        }

        let ideal = CameraFormat::new(
            Resolution::new(config.ideal_width, config.ideal_height),
            FrameFormat::MJPEG,
            30,
        );
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(ideal));

        let mut camera = nokhwa::Camera::new(CameraIndex::Index(config.device_id), requested)
            .map_err(map_error)?;
        camera.open_stream().map_err(map_error)?;

        let resolution = camera.resolution();
        // Devices are addressed by index; facing has no desktop equivalent
        tracing::info!(
            device = config.device_id,
            facing = ?config.facing,
            width = resolution.width(),
            height = resolution.height(),
            "Native camera acquired"
        );

        self.inner = Some(camera);
        self.sequence = 0;
        Ok(())
    }

    fn frame(&mut self) -> Result<Frame, CameraError> {
        let camera = self.inner.as_mut().ok_or(CameraError::NotAcquired)?;
        let buffer = camera
            .frame()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        let (width, height) = (decoded.width(), decoded.height());
        self.sequence += 1;
        Ok(Frame::new(decoded.into_raw(), width, height, self.sequence))
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        self.inner.as_ref().map(|camera| {
            let resolution = camera.resolution();
            (resolution.width(), resolution.height())
        })
    }

    fn is_active(&self) -> bool {
        self.inner.is_some()
    }

    fn release(&mut self) {
        if let Some(mut camera) = self.inner.take() {
            if let Err(e) = camera.stop_stream() {
                tracing::warn!(error = %e, "Failed to stop camera stream cleanly");
            }
            tracing::info!("Native camera released");
        }
    }
}

impl Drop for NativeCamera {
    fn drop(&mut self) {
        self.release();
    }
}
