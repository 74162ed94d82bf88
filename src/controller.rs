//! Top-level owner of a capture flow.
//!
//! The controller holds the session, the camera and the payload sink, and
//! exposes one method per UI event. It ties the camera stream to the CAMERA
//! step: the stream is acquired on entering it and released exactly once on
//! leaving it, whichever way the user leaves.

use crate::capture::{AcquisitionState, Camera, CameraError, CaptureConfig, FileConfig};
use crate::geometry::{map_guide_to_source, GeometryError, GuideLayout, GuideRect, Size};
use crate::payload::{self, DocumentSubmission, PayloadSink, SinkError};
use crate::session::{CaptureTicket, Country, DocType, FlowError, ImageRef, Session, Step};
use crate::upload::{encode_jpeg, read_image_file, DataUri, UploadError};
use std::path::Path;
use thiserror::Error;

/// Errors surfaced to the UI. None of them alter the session.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Running counters for one controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowStats {
    /// Images stored into the session, from either path.
    pub captures: u64,
    /// Camera captures abandoned before reaching the session.
    pub aborted_captures: u64,
    /// Captures dropped because the flow moved on meanwhile.
    pub stale_captures: u64,
    /// Failed camera acquisitions.
    pub acquisition_failures: u64,
    /// Uploads that could not be read.
    pub upload_failures: u64,
    /// Submissions delivered to the sink.
    pub submissions: u64,
}

/// Drives a [`Session`] from UI events.
pub struct FlowController<C: Camera, S: PayloadSink> {
    session: Session,
    camera: C,
    sink: S,
    capture_config: CaptureConfig,
    layout: GuideLayout,
    acquisition: Option<AcquisitionState>,
    stats: FlowStats,
}

impl<C: Camera, S: PayloadSink> FlowController<C, S> {
    /// Creates a controller with default capture settings and guide layout.
    pub fn new(camera: C, sink: S) -> Self {
        Self {
            session: Session::new(),
            camera,
            sink,
            capture_config: CaptureConfig::default(),
            layout: GuideLayout::default(),
            acquisition: None,
            stats: FlowStats::default(),
        }
    }

    /// Creates a controller using the capture and guide sections of `config`.
    pub fn from_config(camera: C, sink: S, config: &FileConfig) -> Self {
        Self::new(camera, sink)
            .with_capture_config(config.capture.clone())
            .with_layout(config.guide.clone())
    }

    pub fn with_capture_config(mut self, config: CaptureConfig) -> Self {
        self.capture_config = config;
        self
    }

    pub fn with_layout(mut self, layout: GuideLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn stats(&self) -> &FlowStats {
        &self.stats
    }

    pub fn layout(&self) -> &GuideLayout {
        &self.layout
    }

    /// Outcome of the current camera acquisition; `None` off the camera step.
    pub fn acquisition(&self) -> Option<&AcquisitionState> {
        self.acquisition.as_ref()
    }

    pub fn select_country(&mut self, country: Country) -> Result<(), ControllerError> {
        Ok(self.session.select_country(country)?)
    }

    pub fn select_doc_type(&mut self, doc_type: DocType) -> Result<(), ControllerError> {
        Ok(self.session.select_doc_type(doc_type)?)
    }

    pub fn continue_to_method(&mut self) -> Result<(), ControllerError> {
        Ok(self.session.continue_to_method()?)
    }

    /// Enters the camera step and requests the stream.
    ///
    /// A failed acquisition does not fail the transition: the step is
    /// entered and the returned state is [`AcquisitionState::Denied`].
    pub fn choose_camera(&mut self) -> Result<&AcquisitionState, ControllerError> {
        self.session.choose_camera()?;
        Ok(self.acquire_camera())
    }

    pub fn choose_upload(&mut self) -> Result<(), ControllerError> {
        Ok(self.session.choose_upload()?)
    }

    /// Retries a denied acquisition.
    pub fn retry_camera(&mut self) -> Result<&AcquisitionState, ControllerError> {
        self.require_step("retry_camera", Step::Camera)?;
        Ok(self.acquire_camera())
    }

    /// Captures the guide region of the current frame using the configured layout.
    pub fn capture_from_camera(&mut self) -> Result<(), ControllerError> {
        let display = self.layout.viewport();
        let guide = self.layout.guide_rect();
        self.capture_from_camera_with(display, guide)
    }

    /// Captures the guide region of the current frame using measured layout.
    ///
    /// `display` is the preview element's size and `guide` the guide box
    /// relative to it. On any failure the session is left as it was and the
    /// user may press capture again.
    pub fn capture_from_camera_with(
        &mut self,
        display: Size,
        guide: GuideRect,
    ) -> Result<(), ControllerError> {
        self.require_step("capture_from_camera", Step::Camera)?;
        let ticket = self.session.capture_ticket();

        let image = match self.grab_guide_region(display, guide) {
            Ok(image) => image,
            Err(e) => {
                self.stats.aborted_captures += 1;
                tracing::warn!(error = %e, "Capture aborted");
                return Err(e);
            }
        };

        self.store(ticket, image.into())
    }

    fn grab_guide_region(
        &mut self,
        display: Size,
        guide: GuideRect,
    ) -> Result<DataUri, ControllerError> {
        let frame = self.camera.frame()?;
        let source = Size::from_pixels(frame.width(), frame.height());
        let region = map_guide_to_source(display, source, guide)?;
        let rect = region
            .to_pixel_rect(frame.width(), frame.height())
            .ok_or(GeometryError::NoCropRegion)?;

        tracing::debug!(
            frame = frame.sequence(),
            ?region,
            ?rect,
            "Cropping guide region"
        );

        let cropped = frame.crop(&rect)?;
        Ok(encode_jpeg(&cropped, self.capture_config.jpeg_quality)?)
    }

    /// Reads a selected file and stores it for the current side.
    pub fn upload_file(&mut self, path: impl AsRef<Path>) -> Result<(), ControllerError> {
        self.require_step("upload_file", Step::Upload)?;
        let ticket = self.session.capture_ticket();

        let uri = match read_image_file(path.as_ref()) {
            Ok(uri) => uri,
            Err(e) => {
                self.stats.upload_failures += 1;
                tracing::warn!(path = %path.as_ref().display(), error = %e, "Upload failed");
                return Err(e.into());
            }
        };

        self.store(ticket, uri.into())
    }

    /// Stores an already encoded upload for the current side.
    pub fn accept_upload(&mut self, uri: DataUri) -> Result<(), ControllerError> {
        self.require_step("accept_upload", Step::Upload)?;
        let ticket = self.session.capture_ticket();
        self.store(ticket, uri.into())
    }

    fn store(
        &mut self,
        ticket: CaptureTicket,
        image: ImageRef,
    ) -> Result<(), ControllerError> {
        match self.session.capture_with_ticket(ticket, image) {
            Ok(()) => {
                self.stats.captures += 1;
                tracing::info!(
                    side = ?ticket.side,
                    step = ?self.session.step(),
                    "Image captured"
                );
                if self.session.step() == Step::Success {
                    self.release_camera();
                }
                Ok(())
            }
            Err(e) => {
                if matches!(e, FlowError::StaleCapture { .. }) {
                    self.stats.stale_captures += 1;
                }
                Err(e.into())
            }
        }
    }

    /// Context-sensitive back navigation.
    pub fn back(&mut self) -> Result<(), ControllerError> {
        self.session.back()?;
        if self.session.step() != Step::Camera {
            self.release_camera();
        }
        Ok(())
    }

    /// Abandons the flow and starts over.
    pub fn retake(&mut self) {
        self.session.retake();
        self.release_camera();
    }

    /// Delivers the submission to the sink, then starts over.
    ///
    /// If the sink fails the session stays on the success screen so the
    /// user can confirm again.
    pub fn confirm(&mut self) -> Result<DocumentSubmission, ControllerError> {
        let submission = payload::assemble(&self.session)?;
        self.sink.deliver(&submission)?;
        self.stats.submissions += 1;
        self.retake();
        Ok(submission)
    }

    fn require_step(&self, operation: &'static str, step: Step) -> Result<(), FlowError> {
        if self.session.step() == step {
            Ok(())
        } else {
            Err(FlowError::InvalidStep {
                operation,
                step: self.session.step(),
            })
        }
    }

    fn acquire_camera(&mut self) -> &AcquisitionState {
        self.acquisition = Some(AcquisitionState::Pending);
        if self.camera.is_active() {
            self.camera.release();
        }

        let state = match self.camera.acquire(&self.capture_config) {
            Ok(()) => {
                let (width, height) = self.camera.resolution().unwrap_or((
                    self.capture_config.ideal_width,
                    self.capture_config.ideal_height,
                ));
                tracing::info!(width, height, "Camera stream granted");
                AcquisitionState::Granted { width, height }
            }
            Err(e) => {
                self.stats.acquisition_failures += 1;
                tracing::warn!(error = %e, message = e.user_message(), "Camera acquisition failed");
                AcquisitionState::Denied(e)
            }
        };
        self.acquisition.insert(state)
    }

    fn release_camera(&mut self) {
        if self.camera.is_active() {
            self.camera.release();
        }
        self.acquisition = None;
    }
}

impl<C: Camera, S: PayloadSink> Drop for FlowController<C, S> {
    fn drop(&mut self) {
        self.release_camera();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MockCamera;
    use crate::session::Side;

    type TestController = FlowController<MockCamera, Vec<DocumentSubmission>>;

    fn controller() -> TestController {
        FlowController::new(MockCamera::new(), Vec::new())
            .with_capture_config(CaptureConfig::with_dimensions(320, 180))
    }

    #[test]
    fn test_camera_acquired_on_entry() {
        let mut flow = controller();
        flow.continue_to_method().unwrap();
        let state = flow.choose_camera().unwrap().clone();

        assert_eq!(state, AcquisitionState::Granted { width: 320, height: 180 });
        assert!(flow.camera().is_active());
    }

    #[test]
    fn test_capture_crops_guide_region() {
        let mut flow = controller();
        flow.continue_to_method().unwrap();
        flow.choose_camera().unwrap();

        flow.capture_from_camera().unwrap();
        let front = flow.session().images().front.clone().unwrap();
        let uri = DataUri::parse(front.as_str()).unwrap();
        let decoded = image::load_from_memory(&uri.decode().unwrap()).unwrap();

        // 320x180 source under a 360x640 viewport: the guide is narrower than the frame
        assert!(decoded.width() < 320);
        assert!(decoded.height() < 180);
        assert_eq!(flow.session().current_side(), Side::Back);
        assert!(flow.camera().is_active());
    }

    #[test]
    fn test_stream_released_once_on_success() {
        let mut flow = controller();
        flow.continue_to_method().unwrap();
        flow.choose_camera().unwrap();
        flow.capture_from_camera().unwrap();
        flow.capture_from_camera().unwrap();

        assert_eq!(flow.session().step(), Step::Success);
        assert!(!flow.camera().is_active());
        assert!(flow.acquisition().is_none());

        flow.confirm().unwrap();
        assert_eq!(flow.camera().acquisitions(), 1);
        assert_eq!(flow.camera().releases(), 1);
        assert_eq!(flow.sink().len(), 1);
    }

    #[test]
    fn test_back_to_front_keeps_stream() {
        let mut flow = controller();
        flow.continue_to_method().unwrap();
        flow.choose_camera().unwrap();
        flow.capture_from_camera().unwrap();

        flow.back().unwrap();
        assert_eq!(flow.session().step(), Step::Camera);
        assert!(flow.camera().is_active());

        flow.back().unwrap();
        assert_eq!(flow.session().step(), Step::ChooseMethod);
        assert!(!flow.camera().is_active());
        assert_eq!(flow.camera().releases(), 1);
    }

    #[test]
    fn test_denied_then_retry() {
        let mut flow = FlowController::new(
            MockCamera::failing(CameraError::PermissionDenied),
            Vec::<DocumentSubmission>::new(),
        );
        flow.continue_to_method().unwrap();

        let state = flow.choose_camera().unwrap().clone();
        assert_eq!(state, AcquisitionState::Denied(CameraError::PermissionDenied));
        assert_eq!(flow.session().step(), Step::Camera);
        assert_eq!(flow.stats().acquisition_failures, 1);

        assert!(matches!(
            flow.capture_from_camera(),
            Err(ControllerError::Camera(CameraError::NotAcquired))
        ));
        assert_eq!(flow.session().images().front, None);

        flow.camera.clear_failure();
        assert!(flow.retry_camera().unwrap().is_granted());
    }

    #[test]
    fn test_geometry_failure_leaves_session() {
        let mut flow = controller();
        flow.continue_to_method().unwrap();
        flow.choose_camera().unwrap();
        let generation = flow.session().generation();

        let display = Size::new(100.0, 100.0);
        let outside = GuideRect::new(500.0, 500.0, 50.0, 50.0);
        assert!(matches!(
            flow.capture_from_camera_with(display, outside),
            Err(ControllerError::Geometry(GeometryError::NoCropRegion))
        ));
        assert_eq!(flow.session().generation(), generation);
        assert_eq!(flow.session().current_side(), Side::Front);
        assert_eq!(flow.stats().aborted_captures, 1);

        flow.capture_from_camera().unwrap();
        assert_eq!(flow.session().current_side(), Side::Back);
    }

    #[test]
    fn test_upload_rejected_on_camera_step() {
        let mut flow = controller();
        flow.continue_to_method().unwrap();
        flow.choose_camera().unwrap();

        let uri = DataUri::encode("image/png", b"png");
        assert!(matches!(
            flow.accept_upload(uri),
            Err(ControllerError::Flow(FlowError::InvalidStep { .. }))
        ));
    }

    #[test]
    fn test_upload_read_error_counted() {
        let mut flow = controller();
        flow.continue_to_method().unwrap();
        flow.choose_upload().unwrap();

        assert!(matches!(
            flow.upload_file("/nonexistent/front.png"),
            Err(ControllerError::Upload(UploadError::Read(_)))
        ));
        assert_eq!(flow.stats().upload_failures, 1);
        assert_eq!(flow.session().images().front, None);
    }

    #[test]
    fn test_retake_releases_stream() {
        let mut flow = controller();
        flow.continue_to_method().unwrap();
        flow.choose_camera().unwrap();
        flow.retake();

        assert!(!flow.camera().is_active());
        assert_eq!(flow.session().step(), Step::Selection);
    }
}
