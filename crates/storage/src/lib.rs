//! Collection model and store interfaces.
//!
//! The collection is made of [`Item`] records, each optionally pointing at
//! a cover image held in a separate blob store. This crate defines both the
//! model and the two store traits; concrete persistent stores live in their
//! own crates, in-memory ones are available behind the `mock` feature.

pub mod backend;
pub mod error;
mod item;
mod meta;
mod tag;

pub use crate::backend::{Blob, BlobStore, ItemStore};
pub use crate::item::{CoverImage, CoverRef, Item};
pub use crate::meta::{MetaData, MetaValue};
pub use crate::tag::Tag;
use std::sync::Arc;

pub type ItemHandle = Arc<dyn ItemStore + Send + Sync>;
pub type BlobHandle = Arc<dyn BlobStore + Send + Sync>;
