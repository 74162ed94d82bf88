//! Destinations for finished submissions.

use super::DocumentSubmission;
use std::io::Write;
use thiserror::Error;

/// Errors raised while delivering a submission.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to serialize submission: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write submission: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives each completed submission exactly once.
///
/// Transport and storage are entirely the sink's concern.
pub trait PayloadSink {
    fn deliver(&mut self, submission: &DocumentSubmission) -> Result<(), SinkError>;
}

/// Writes submissions as JSON, one document per delivery.
pub struct WriterSink<W: Write> {
    writer: W,
    pretty: bool,
}

/// Prints submissions to standard output.
pub type StdoutSink = WriterSink<std::io::Stdout>;

impl StdoutSink {
    pub fn stdout(pretty: bool) -> Self {
        Self::new(std::io::stdout(), pretty)
    }
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, pretty: bool) -> Self {
        Self { writer, pretty }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consumes the sink, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> PayloadSink for WriterSink<W> {
    fn deliver(&mut self, submission: &DocumentSubmission) -> Result<(), SinkError> {
        let json = if self.pretty {
            submission.to_json_pretty()?
        } else {
            submission.to_json()?
        };
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;

        tracing::info!(
            country = %submission.country,
            doc_type = %submission.doc_type,
            has_back = submission.images.back.is_some(),
            bytes = json.len(),
            "Submission delivered"
        );
        Ok(())
    }
}

impl PayloadSink for Vec<DocumentSubmission> {
    fn deliver(&mut self, submission: &DocumentSubmission) -> Result<(), SinkError> {
        self.push(submission.clone());
        Ok(())
    }
}
