//! Capture flow state.
//!
//! The session tracks the screen the user is on, the selected country and
//! document type, which side is being captured, and the images gathered so
//! far. It is owned by a single controller and only changes through the
//! transition methods on [`Session`].

mod machine;
mod types;

pub use machine::{CaptureTicket, Session};
pub use types::{Country, DocOption, DocType, ImageRef, ImageSlots, Side, Step};

use thiserror::Error;

/// Rejected transitions. None of them modify the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("{operation} is not available on the {step:?} step")]
    InvalidStep { operation: &'static str, step: Step },
    #[error("{doc_type} is not offered for {country}")]
    DocTypeUnavailable { doc_type: DocType, country: Country },
    #[error("captured image is empty")]
    EmptyImage,
    #[error("capture started at generation {ticket} arrived at generation {current}")]
    StaleCapture { ticket: u64, current: u64 },
}
