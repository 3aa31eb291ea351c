//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Collection operations turn these
//! into [`Outcome::Error`](crate::Outcome::Error) at their public boundary.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Rejected before any store was touched.
    #[display("invalid item: {_0}")]
    Validation(#[error(not(source))] &'static str),
    /// A store call failed; the operation names what was being attempted.
    #[display("storage failure while trying to {_0}")]
    Storage(#[error(not(source))] &'static str),
    #[display("could not read {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// The extracted cover could not be decoded as an image.
    #[display("could not create a thumbnail from the extracted cover")]
    Thumbnail,
    #[display("background task failed")]
    Task,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io(_))
    }
}
