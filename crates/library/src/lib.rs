//! Book collection logic.
//!
//! [`BookCreator`] turns documents into [`Item`](shelf_storage::Item)s keyed
//! by content checksum, [`Collection`] deduplicates and manages them on top
//! of an item store and a blob store.

mod checksum;
mod collection;
mod creator;
pub mod error;
mod reference;

pub use crate::checksum::checksum;
pub use crate::collection::{Collection, Outcome};
pub use crate::creator::{BookCreator, COVER_NAME};
pub use crate::reference::{RandomReferences, ReferenceGenerator};
