//! Error type shared by every core component.
//!
//! All variants are recoverable: a failed load, restore or save leaves the
//! session exactly as it was before the attempt.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = ReaderError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ReaderError {
    /// Extraction produced no non-empty paragraph.
    #[error("document contains no readable text")]
    EmptyDocument,

    #[error("unsupported document format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// The extractor for the source failed (missing file, malformed file,
    /// OCR engine unavailable).
    #[error("failed to extract text from {}: {reason}", path.display())]
    ExtractionFailure { path: PathBuf, reason: String },

    #[error("progress record {} is invalid: {reason}", path.display())]
    ProgressRecordCorrupt { path: PathBuf, reason: String },

    /// The document referenced by a progress record no longer exists and no
    /// substitute was provided.
    #[error("source document {} could not be found", path.display())]
    SourceUnresolvable { path: PathBuf },

    #[error("operation cancelled at stage={stage}")]
    Cancelled { stage: &'static str },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReaderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReaderError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn extraction(path: impl Into<PathBuf>, err: anyhow::Error) -> Self {
        ReaderError::ExtractionFailure {
            path: path.into(),
            reason: format!("{err:#}"),
        }
    }
}
