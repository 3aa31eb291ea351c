//! SQLite persistence for the collection.
//!
//! One database file holds both stores:
//! - **items**: one row per [`Item`](shelf_storage::Item), keyed by content
//!   address. Tags and legacy metadata are JSON columns; cover bytes are
//!   never stored in this table.
//! - **blobs**: cover images and metadata files, keyed by
//!   [`CoverRef`](shelf_storage::CoverRef).
//!
//! Row conversion goes through an explicit [`ItemCodec`] handed to
//! [`SqliteItemStore::new()`].

mod codec;
mod db;
pub mod error;
mod models;
mod store;

pub use crate::codec::{ItemCodec, JsonCodec};
pub use crate::db::Database;
pub use crate::models::ItemRow;
pub use crate::store::{SqliteBlobStore, SqliteItemStore};
