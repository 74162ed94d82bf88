//! Prometheus metrics exporter for capture flow monitoring.
//!
//! # Metrics Exposed
//!
//! ## Flow State
//! - `id_capture_step` - Current step (0=selection .. 4=success)
//! - `id_capture_camera_active` - Whether a camera stream is held
//!
//! ## Captures
//! - `id_capture_captures_total` - Images stored into the session
//! - `id_capture_aborted_captures_total` - Camera captures aborted (device or geometry errors)
//! - `id_capture_stale_captures_total` - Captures dropped after the flow moved on
//!
//! ## Failures
//! - `id_capture_acquisition_failures_total` - Failed camera acquisitions
//! - `id_capture_upload_failures_total` - Unreadable uploads
//!
//! ## Output
//! - `id_capture_submissions_total` - Submissions delivered to the sink
//!
//! # Example
//!
//! ```no_run
//! use id_capture::metrics::{MetricsRegistry, MetricsSnapshot};
//! use id_capture::session::Step;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     step: Step::Camera,
//!     camera_active: true,
//!     captures: 1,
//!     ..Default::default()
//! };
//!
//! registry.update(&snapshot);
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
