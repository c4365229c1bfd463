//! Error types for the docfield-core library.
//!
//! Field extraction itself is total and never fails; these errors only
//! cover the edges around it (tags, configuration, OCR payloads, I/O).

use thiserror::Error;

/// Main error type for the docfield library.
#[derive(Error, Debug)]
pub enum DocfieldError {
    /// A document-type tag that names none of the supported kinds.
    #[error("unknown document type: {0}")]
    UnknownDocType(String),

    /// The cached OCR provider response could not be decoded.
    #[error("invalid OCR payload: {0}")]
    OcrPayload(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for the docfield library.
pub type Result<T> = std::result::Result<T, DocfieldError>;
