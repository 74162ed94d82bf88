//! Payload assembly and delivery.
//!
//! A confirmed session becomes a [`DocumentSubmission`]: the country, the
//! document type and the base64 images tagged by side. The core only
//! guarantees a structurally valid value per completed flow; where it goes
//! is up to the [`PayloadSink`].

mod sink;
mod submission;

pub use sink::{PayloadSink, SinkError, StdoutSink, WriterSink};
pub use submission::{assemble, DocumentSubmission, SubmissionImages};
