//! The finished output of a capture flow.

use crate::session::{Country, DocType, FlowError, Session, Step};
use serde::{Deserialize, Serialize};

/// Captured images on the wire. Missing sides are omitted, never null.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmissionImages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
}

/// Structured result handed to the payload sink once per completed flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSubmission {
    pub country: Country,
    pub doc_type: DocType,
    pub images: SubmissionImages,
}

impl DocumentSubmission {
    /// Compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Indented JSON, as printed for diagnostics.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Builds the submission from a session on the success screen.
pub fn assemble(session: &Session) -> Result<DocumentSubmission, FlowError> {
    if session.step() != Step::Success {
        return Err(FlowError::InvalidStep {
            operation: "confirm",
            step: session.step(),
        });
    }

    Ok(DocumentSubmission {
        country: session.country(),
        doc_type: session.doc_type(),
        images: SubmissionImages {
            front: session.images().front.as_ref().map(|image| image.as_str().to_string()),
            back: session.images().back.as_ref().map(|image| image.as_str().to_string()),
        },
    })
}
