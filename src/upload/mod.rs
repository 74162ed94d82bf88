//! Image encoding for the upload and capture paths.
//!
//! Both paths end in the same place: a self-contained data URI that the
//! session stores per document side.

mod data_uri;
mod reader;

pub use data_uri::DataUri;
pub use reader::{encode_jpeg, read_image_file, JPEG_MIME};

use thiserror::Error;

/// Errors from reading or encoding images.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadError {
    #[error("failed to read file: {0}")]
    Read(String),
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("failed to encode image: {0}")]
    Encode(String),
    #[error("malformed data URI: {0}")]
    MalformedDataUri(String),
}
