//! In-memory stores for testing.

use crate::backend::{Blob, BlobStore, ItemStore};
use crate::error::{ErrorKind, Result};
use crate::{CoverRef, Item};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// In-memory [`ItemStore`] for testing.
///
/// Records are kept in a `BTreeMap` behind a [`RwLock`], so listings come
/// back ordered by id and all trait methods can operate on `&self`.
///
/// # Examples
///
/// ```
/// use shelf_storage::backend::{ItemStore, MemoryItemStore};
/// use shelf_storage::Item;
/// use time::UtcDateTime;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryItemStore::with_items([
///     Item::new("abc", "Dune", "/books/Dune.epub", "epub", UtcDateTime::now()),
/// ]);
/// assert!(store.get("abc").await?.is_some());
/// # Ok(())
/// # }
/// ```
pub struct MemoryItemStore {
    name: String,
    items: RwLock<BTreeMap<String, Item>>,
}

impl MemoryItemStore {
    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let items = items.into_iter().map(|item| (item.id.clone(), item.dehydrated())).collect();
        Self { name: "memory".to_string(), items: RwLock::new(items) }
    }

    /// Change the name of the store.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
impl Default for MemoryItemStore {
    fn default() -> Self {
        Self::with_items([])
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, id: &str) -> Result<Option<Item>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Item>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Vec<Item>> {
        Ok(self.items.read().await.values().filter(|item| item.id.starts_with(prefix)).cloned().collect())
    }

    async fn insert(&self, item: &Item) -> Result<()> {
        let mut guard = self.items.write().await;
        if guard.contains_key(&item.id) {
            exn::bail!(ErrorKind::AlreadyExists(item.id.clone()));
        }
        guard.insert(item.id.clone(), item.dehydrated());
        Ok(())
    }

    async fn upsert(&self, item: &Item) -> Result<()> {
        self.items.write().await.insert(item.id.clone(), item.dehydrated());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.items
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(id.to_string())))
    }
}

/// In-memory [`BlobStore`] for testing.
///
/// [`fail_writes()`](Self::fail_writes) makes every subsequent write return
/// a [`Backend`](ErrorKind::Backend) error, for exercising failure paths.
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<CoverRef, Blob>>,
    failing: RwLock<bool>,
}

impl MemoryBlobStore {
    pub fn with_blobs(blobs: impl IntoIterator<Item = (impl Into<CoverRef>, impl Into<String>, impl Into<Vec<u8>>)>) -> Self {
        let blobs = blobs
            .into_iter()
            .map(|(reference, name, data)| (reference.into(), Blob { name: name.into(), data: data.into() }))
            .collect();
        Self { blobs: RwLock::new(blobs), failing: RwLock::new(false) }
    }

    pub async fn fail_writes(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    async fn check_writable(&self) -> Result<()> {
        if *self.failing.read().await {
            exn::bail!(ErrorKind::Backend("memory blob store is failing writes".to_string()));
        }
        Ok(())
    }
}
impl Default for MemoryBlobStore {
    fn default() -> Self {
        let blobs: [(CoverRef, String, Vec<u8>); 0] = [];
        Self::with_blobs(blobs)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn add(&self, reference: &CoverRef, name: &str, data: &[u8]) -> Result<()> {
        self.check_writable().await?;
        let mut guard = self.blobs.write().await;
        if guard.contains_key(reference) {
            exn::bail!(ErrorKind::AlreadyExists(reference.to_string()));
        }
        guard.insert(reference.clone(), Blob { name: name.to_string(), data: data.to_vec() });
        Ok(())
    }

    async fn update(&self, reference: &CoverRef, data: &[u8]) -> Result<()> {
        self.check_writable().await?;
        let mut guard = self.blobs.write().await;
        let blob = guard.get_mut(reference).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(reference.to_string())))?;
        blob.data = data.to_vec();
        Ok(())
    }

    async fn delete(&self, reference: &CoverRef) -> Result<()> {
        self.check_writable().await?;
        self.blobs
            .write()
            .await
            .remove(reference)
            .map(|_| ())
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(reference.to_string())))
    }

    async fn get(&self, reference: &CoverRef) -> Result<Option<Blob>> {
        Ok(self.blobs.read().await.get(reference).cloned())
    }

    async fn contains(&self, reference: &CoverRef) -> Result<bool> {
        Ok(self.blobs.read().await.contains_key(reference))
    }
}
