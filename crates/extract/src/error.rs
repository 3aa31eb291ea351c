//! Extraction Error Types
//!
//! These never leave the crate's public entry point: a cover that can't be
//! extracted is logged and treated as "no cover". They exist so the log line
//! carries the full error tree.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The FB2 document is not well-formed XML.
    #[display("malformed FB2 document")]
    MalformedFb2,
    /// The cover binary is not valid base64.
    #[display("invalid base64 in FB2 binary {_0:?}")]
    InvalidBinary(#[error(not(source))] String),
    /// The EPUB container could not be opened.
    #[display("unreadable EPUB container")]
    Epub,
    #[display("PDF cover rendering failed")]
    Pdf,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Documents are either readable or they're not.
        false
    }
}
