//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Pixel buffer doesn't describe a bitmap that can be wrapped.
    #[display("invalid bitmap: {_0}")]
    InvalidBitmap(#[error(not(source))] &'static str),
    /// Input bytes are not an image in any enabled format.
    #[display("could not decode image")]
    Decode,
    #[display("could not encode image")]
    Encode,
    /// The pdfium library could not be loaded (or support was not compiled in).
    #[display("PDF rendering is unavailable")]
    PdfUnavailable,
    /// Document could be loaded but not rendered.
    #[display("could not render PDF page")]
    PdfRender,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
