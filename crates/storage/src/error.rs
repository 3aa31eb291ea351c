//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Every store implementation raises
//! these kinds, regardless of what sits underneath it.

use derive_more::{Display, Error};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Item or blob does not exist
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Key is already occupied (for operations that require new keys)
    #[display("already exists: {_0}")]
    AlreadyExists(#[error(not(source))] String),
    /// Tag is empty or longer than [`Tag::MAX_LENGTH`](crate::Tag::MAX_LENGTH)
    #[display("invalid tag: {_0:?}")]
    InvalidTag(#[error(not(source))] String),
    /// Persisted data could not be converted back into the model.
    #[display("invalid stored data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// Backend-specific error
    #[display("backend error: {_0}")]
    Backend(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
