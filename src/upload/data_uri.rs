//! Self-contained `data:` URIs carrying base64 image bytes.

use super::UploadError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::str::FromStr;

/// An encoded image: MIME type plus base64 payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime: String,
    data: String,
}

impl DataUri {
    /// Base64-encodes `bytes` under the given MIME type.
    pub fn encode(mime: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime: mime.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Parses a `data:<mime>;base64,<payload>` string.
    pub fn parse(uri: &str) -> Result<Self, UploadError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| UploadError::MalformedDataUri("missing data: scheme".into()))?;
        let (mime, data) = rest
            .split_once(";base64,")
            .ok_or_else(|| UploadError::MalformedDataUri("not base64 encoded".into()))?;
        if mime.is_empty() {
            return Err(UploadError::MalformedDataUri("missing media type".into()));
        }
        STANDARD
            .decode(data)
            .map_err(|e| UploadError::MalformedDataUri(e.to_string()))?;

        Ok(Self {
            mime: mime.to_string(),
            data: data.to_string(),
        })
    }

    /// MIME type of the payload.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// The base64 payload without the URI prefix.
    pub fn base64(&self) -> &str {
        &self.data
    }

    /// Decodes the payload bytes.
    pub fn decode(&self) -> Result<Vec<u8>, UploadError> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| UploadError::MalformedDataUri(e.to_string()))
    }

    /// Length of the full URI string.
    pub fn len(&self) -> usize {
        "data:".len() + self.mime.len() + ";base64,".len() + self.data.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, self.data)
    }
}

impl FromStr for DataUri {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DataUri> for String {
    fn from(uri: DataUri) -> Self {
        uri.to_string()
    }
}
