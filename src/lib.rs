//! Guided Identity Document Capture Library
//!
//! Walks a user through capturing or uploading images of an identity
//! document (national ID front and back, or passport) and produces a
//! structured submission of base64 images tagged by side.
//!
//! # Architecture
//!
//! ```text
//! UI event → FlowController → Session transition
//!                 ↓ (camera)
//!           frame → geometry (guide → crop) → JPEG data URI
//!                 ↓ (confirm)
//!           payload::assemble → PayloadSink
//! ```
//!
//! # Design Principles
//!
//! - **Explicit ownership**: one [`Session`] per flow, mutated only through named transitions
//! - **Pure geometry**: the crop mapping is a function of numbers, testable without a display
//! - **Failures never corrupt state**: camera, geometry and upload errors leave the session as it was
//! - **Deterministic stream lifetime**: the camera is released exactly once when leaving the camera step
//!
//! # Example
//!
//! ```no_run
//! use id_capture::{
//!     capture::MockCamera,
//!     payload::DocumentSubmission,
//!     session::{Country, DocType},
//!     FlowController,
//! };
//!
//! let mut flow = FlowController::new(MockCamera::new(), Vec::<DocumentSubmission>::new());
//!
//! flow.select_country(Country::SG).unwrap();
//! flow.select_doc_type(DocType::Passport).unwrap();
//! flow.continue_to_method().unwrap();
//!
//! if flow.choose_camera().unwrap().is_granted() {
//!     flow.capture_from_camera().unwrap();
//!     let submission = flow.confirm().unwrap();
//!     println!("{}", submission.to_json_pretty().unwrap());
//! }
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod controller;
pub mod geometry;
pub mod metrics;
pub mod payload;
pub mod session;
pub mod upload;

// Re-export commonly used types at crate root
pub use capture::{AcquisitionState, Camera, CameraError, CaptureConfig, FileConfig, MockCamera};
pub use controller::{ControllerError, FlowController, FlowStats};
pub use geometry::{map_guide_to_source, CropRegion, GeometryError, GuideLayout, GuideRect, Size};
pub use payload::{assemble, DocumentSubmission, PayloadSink, StdoutSink};
pub use session::{Country, DocType, FlowError, Session, Side, Step};
pub use upload::DataUri;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
