//! Store traits and implementations.
//!
//! Items and the binary payloads they point at (covers, file-bearing
//! metadata) live in two separate keyed stores. Neither store knows about the
//! other; keeping them consistent is the collection's job.

#[cfg(feature = "mock")]
mod memory;

#[cfg(feature = "mock")]
pub use self::memory::{MemoryBlobStore, MemoryItemStore};
use crate::error::Result;
use crate::{CoverRef, Item};
use async_trait::async_trait;

/// Binary payload as held by a [`BlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub name: String,
    pub data: Vec<u8>,
}

/// Keyed document store for [`Item`] records.
///
/// Records never hold cover bytes: implementations persist
/// [`Item::dehydrated()`] and return items whose covers have empty `data`.
///
/// # Examples
///
/// ```
/// use shelf_storage::{backend::ItemStore, error::Result};
///
/// async fn is_active(store: &dyn ItemStore, id: &str) -> Result<bool> {
///     Ok(store.get(id).await?.is_some_and(|item| !item.deleted))
/// }
/// ```
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Name of the store, used for logging only.
    fn name(&self) -> &str;

    /// Fetch a single record by id, deleted or not.
    async fn get(&self, id: &str) -> Result<Option<Item>>;

    /// Every record, deleted or not.
    async fn get_all(&self) -> Result<Vec<Item>>;

    /// Every record whose id starts with `prefix`.
    async fn find_by_prefix(&self, prefix: &str) -> Result<Vec<Item>>;

    /// Store a new record.
    ///
    /// Returns [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists) if the
    /// id is taken.
    async fn insert(&self, item: &Item) -> Result<()>;

    /// Store a record, replacing any existing record with the same id.
    async fn upsert(&self, item: &Item) -> Result<()>;

    /// Remove a record.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if there is no
    /// record with that id.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Keyed store for binary payloads.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a new blob.
    ///
    /// Returns [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists) if the
    /// reference is occupied; the existing bytes are left alone.
    async fn add(&self, reference: &CoverRef, name: &str, data: &[u8]) -> Result<()>;

    /// Replace the bytes of an existing blob, keeping its name.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the
    /// reference is free.
    async fn update(&self, reference: &CoverRef, data: &[u8]) -> Result<()>;

    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the
    /// reference is free.
    async fn delete(&self, reference: &CoverRef) -> Result<()>;

    async fn get(&self, reference: &CoverRef) -> Result<Option<Blob>>;

    async fn contains(&self, reference: &CoverRef) -> Result<bool>;

    /// Write a blob whether or not the reference is already occupied.
    ///
    /// Not atomic: the default implementation checks before writing.
    async fn put(&self, reference: &CoverRef, name: &str, data: &[u8]) -> Result<()> {
        if self.contains(reference).await? {
            self.update(reference, data).await
        } else {
            self.add(reference, name, data).await
        }
    }
}
