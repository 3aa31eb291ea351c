//! The collection: deduplication and lifecycle over an item store and a
//! blob store.
//!
//! Every item id is in one of three states: unknown, active, or
//! soft-deleted. Adding an active id is refused, adding a soft-deleted id
//! restores it (keeping its original cover reference), and nothing in the
//! soft-delete flow ever removes a record. Cover bytes always reach the blob
//! store before the record that points at them.
//!
//! # Concurrency
//! Operations are check-then-act against the stores and assume a single
//! writer: two concurrent [`add_item()`](Collection::add_item) calls for the
//! same new id can both pass the existence check, and the loser surfaces as
//! [`Outcome::Error`].

use crate::error::{ErrorKind, Result};
use exn::{Frame, ResultExt};
use shelf_storage::error::ErrorKind as StorageErrorKind;
use shelf_storage::{BlobHandle, CoverImage, CoverRef, Item, ItemHandle, MetaData, MetaValue, Tag};
use tracing::instrument;

/// Result of a collection operation.
///
/// Every variant except [`Error`](Outcome::Error) carries the item as the
/// collection now holds it (or, for `NotFound`, as it was asked about).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Added(Item),
    Updated(Item),
    NotFound(Item),
    AlreadyExists(Item),
    /// Record and blobs were permanently removed.
    Deleted(Item),
    Error(String),
}

impl Outcome {
    pub fn item(&self) -> Option<&Item> {
        match self {
            Self::Added(item)
            | Self::Updated(item)
            | Self::NotFound(item)
            | Self::AlreadyExists(item)
            | Self::Deleted(item) => Some(item),
            Self::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

fn settle(operation: &'static str, result: Result<Outcome>) -> Outcome {
    match result {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(operation, error = ?err, "collection operation failed");
            Outcome::Error(message(err.frame()))
        },
    }
}

/// Every message along the first-cause chain, outermost first.
fn message(frame: &Frame) -> String {
    let mut parts = vec![frame.to_string()];
    let mut current = frame;
    while let Some(cause) = current.children().first() {
        parts.push(cause.to_string());
        current = cause;
    }
    parts.join(": ")
}

fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        exn::bail!(ErrorKind::Validation("empty id"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct Collection {
    items: ItemHandle,
    blobs: BlobHandle,
}

impl Collection {
    pub fn new(items: ItemHandle, blobs: BlobHandle) -> Self {
        Self { items, blobs }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Every record, active and soft-deleted, with covers loaded from the
    /// blob store. A cover whose blob is missing comes back with empty data.
    pub async fn get_items(&self) -> Result<Vec<Item>> {
        let items = self.items.get_all().await.or_raise(|| ErrorKind::Storage("list items"))?;
        self.hydrate_all(items).await
    }

    /// Every record (active and soft-deleted) whose id starts with `prefix`,
    /// with covers loaded like [`get_items()`](Self::get_items).
    pub async fn find(&self, prefix: &str) -> Result<Vec<Item>> {
        let items = self.items.find_by_prefix(prefix).await.or_raise(|| ErrorKind::Storage("find items"))?;
        self.hydrate_all(items).await
    }

    async fn hydrate_all(&self, items: Vec<Item>) -> Result<Vec<Item>> {
        let mut hydrated = Vec::with_capacity(items.len());
        for item in items {
            hydrated.push(self.hydrate(item).await?);
        }
        Ok(hydrated)
    }

    async fn hydrate(&self, item: Item) -> Result<Item> {
        let Some(cover) = &item.cover else {
            return Ok(item);
        };
        let blob = self.blobs.get(&cover.reference).await.or_raise(|| ErrorKind::Storage("load cover"))?;
        let cover = match blob {
            Some(blob) => CoverImage { data: blob.data, ..cover.clone() },
            None => {
                tracing::debug!(id = %item.id, reference = %cover.reference, "cover blob is missing");
                cover.clone()
            },
        };
        Ok(item.with_cover(Some(cover)))
    }

    // =========================================================================
    // Add / Update
    // =========================================================================

    /// Add a new item, or restore a soft-deleted one with the same id.
    ///
    /// - unknown id: the cover blob is written, then the record. If the
    ///   record can't be written the blob is removed again.
    /// - active id: [`Outcome::AlreadyExists`] with the stored item; nothing
    ///   is written.
    /// - soft-deleted id: updated from the incoming item, except that the
    ///   stored cover reference is kept.
    #[instrument(skip_all, fields(id = %item.id))]
    pub async fn add_item(&self, item: Item) -> Outcome {
        settle("add item", self.add_item_inner(item).await)
    }

    async fn add_item_inner(&self, item: Item) -> Result<Outcome> {
        validate_id(&item.id)?;
        match self.items.get(&item.id).await.or_raise(|| ErrorKind::Storage("look up item"))? {
            Some(existing) if !existing.deleted => Ok(Outcome::AlreadyExists(existing)),
            Some(existing) => {
                let cover = match (item.cover.clone(), existing.cover) {
                    (Some(incoming), Some(stored)) => Some(CoverImage { reference: stored.reference, ..incoming }),
                    (incoming, stored) => incoming.or(stored),
                };
                tracing::info!("restoring soft-deleted item");
                self.update_item_inner(item.with_cover(cover)).await
            },
            None => self.insert_new(item).await,
        }
    }

    async fn insert_new(&self, item: Item) -> Result<Outcome> {
        let written = match &item.cover {
            Some(cover) if cover.is_hydrated() => {
                self.blobs
                    .add(&cover.reference, &cover.name, &cover.data)
                    .await
                    .or_raise(|| ErrorKind::Storage("store cover"))?;
                Some(cover.reference.clone())
            },
            _ => None,
        };
        let written: Vec<CoverRef> = written
            .into_iter()
            .chain(Self::file_references(&item.metadata).cloned())
            .collect();
        let stored = match self.write_metadata_files(&item.metadata).await {
            Ok(()) => self.items.insert(&item).await.or_raise(|| ErrorKind::Storage("insert item")),
            Err(err) => Err(err),
        };
        if let Err(err) = stored {
            for reference in &written {
                if let Err(cleanup) = self.blobs.delete(reference).await
                    && !matches!(&*cleanup, StorageErrorKind::NotFound(_))
                {
                    tracing::warn!(%reference, error = ?cleanup, "could not remove blob of unsaved item");
                }
            }
            return Err(err);
        }
        tracing::info!("added item");
        Ok(Outcome::Added(item))
    }

    /// Overwrite an existing record.
    ///
    /// Cover bytes (and any file-bearing metadata bytes) are written to the
    /// blob store first. A cover without data leaves its blob alone.
    #[instrument(skip_all, fields(id = %item.id))]
    pub async fn update_item(&self, item: Item) -> Outcome {
        settle("update item", self.update_item_inner(item).await)
    }

    async fn update_item_inner(&self, item: Item) -> Result<Outcome> {
        validate_id(&item.id)?;
        let Some(existing) = self.items.get(&item.id).await.or_raise(|| ErrorKind::Storage("look up item"))? else {
            return Ok(Outcome::NotFound(item));
        };
        // The creation date is fixed by the first insert.
        let item = Item { created: existing.created, ..item };
        if let Some(cover) = &item.cover
            && cover.is_hydrated()
        {
            self.blobs.put(&cover.reference, &cover.name, &cover.data).await.or_raise(|| ErrorKind::Storage("store cover"))?;
        }
        self.write_metadata_files(&item.metadata).await?;
        self.items.upsert(&item).await.or_raise(|| ErrorKind::Storage("update item"))?;
        Ok(Outcome::Updated(item))
    }

    /// References of file-bearing metadata that carry bytes to be written.
    fn file_references(metadata: &[MetaData]) -> impl Iterator<Item = &CoverRef> {
        metadata.iter().filter_map(|meta| match &meta.value {
            MetaValue::File { reference, data: Some(_) } => Some(reference),
            _ => None,
        })
    }

    async fn write_metadata_files(&self, metadata: &[MetaData]) -> Result<()> {
        for meta in metadata {
            if let MetaValue::File { reference, data: Some(data) } = &meta.value {
                self.blobs.put(reference, &meta.name, data).await.or_raise(|| ErrorKind::Storage("store metadata file"))?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Lifecycle shortcuts
    // =========================================================================

    /// Load, change, and write back an item.
    async fn modify(&self, id: &str, change: impl FnOnce(Item) -> Item + Send) -> Result<Outcome> {
        validate_id(id)?;
        match self.items.get(id).await.or_raise(|| ErrorKind::Storage("look up item"))? {
            Some(item) => self.update_item_inner(change(item)).await,
            None => Ok(Outcome::NotFound(Item::placeholder(id))),
        }
    }

    /// Soft-delete (`true`) or restore (`false`) an item.
    #[instrument(skip(self))]
    pub async fn set_deleted(&self, id: &str, deleted: bool) -> Outcome {
        settle("set deleted", self.modify(id, |item| item.with_deleted(deleted)).await)
    }

    #[instrument(skip(self))]
    pub async fn set_read(&self, id: &str, read: bool) -> Outcome {
        settle("set read", self.modify(id, |item| item.with_read(read)).await)
    }

    #[instrument(skip(self, tag), fields(tag = %tag))]
    pub async fn add_tag(&self, id: &str, tag: Tag) -> Outcome {
        settle("add tag", self.modify(id, |item| item.with_tag(tag)).await)
    }

    #[instrument(skip(self, tag), fields(tag = %tag))]
    pub async fn remove_tag(&self, id: &str, tag: &Tag) -> Outcome {
        settle("remove tag", self.modify(id, |item| item.without_tag(tag)).await)
    }

    // =========================================================================
    // Legacy metadata and hard delete
    // =========================================================================

    /// Append a metadata entry. File bytes are stored before the record is
    /// touched; if that fails the record is left as it was.
    #[instrument(skip(self, meta), fields(name = %meta.name))]
    pub async fn add_metadata(&self, id: &str, meta: MetaData) -> Outcome {
        settle("add metadata", self.add_metadata_inner(id, meta).await)
    }

    async fn add_metadata_inner(&self, id: &str, meta: MetaData) -> Result<Outcome> {
        validate_id(id)?;
        let Some(item) = self.items.get(id).await.or_raise(|| ErrorKind::Storage("look up item"))? else {
            return Ok(Outcome::NotFound(Item::placeholder(id)));
        };
        self.write_metadata_files(std::slice::from_ref(&meta)).await?;
        let mut metadata = item.metadata.clone();
        metadata.push(meta.without_data());
        let item = item.with_metadata(metadata);
        self.items.upsert(&item).await.or_raise(|| ErrorKind::Storage("update item"))?;
        Ok(Outcome::Updated(item))
    }

    /// Remove the first entry equal to `meta` (file bytes are ignored in the
    /// comparison). A file-bearing entry loses its blob before the record is
    /// rewritten.
    #[instrument(skip(self, meta), fields(name = %meta.name))]
    pub async fn delete_metadata(&self, id: &str, meta: &MetaData) -> Outcome {
        settle("delete metadata", self.delete_metadata_inner(id, meta).await)
    }

    async fn delete_metadata_inner(&self, id: &str, meta: &MetaData) -> Result<Outcome> {
        validate_id(id)?;
        let Some(item) = self.items.get(id).await.or_raise(|| ErrorKind::Storage("look up item"))? else {
            return Ok(Outcome::NotFound(Item::placeholder(id)));
        };
        let target = meta.without_data();
        let Some(index) = item.metadata.iter().position(|entry| entry.without_data() == target) else {
            return Ok(Outcome::NotFound(item));
        };
        if let Some(reference) = target.file_reference() {
            self.delete_blob(reference).await?;
        }
        let mut metadata = item.metadata.clone();
        metadata.remove(index);
        let item = item.with_metadata(metadata);
        self.items.upsert(&item).await.or_raise(|| ErrorKind::Storage("update item"))?;
        Ok(Outcome::Updated(item))
    }

    /// Permanently remove an item: every blob it references, then the record.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: &str) -> Outcome {
        settle("delete item", self.delete_item_inner(id).await)
    }

    async fn delete_item_inner(&self, id: &str) -> Result<Outcome> {
        validate_id(id)?;
        let Some(item) = self.items.get(id).await.or_raise(|| ErrorKind::Storage("look up item"))? else {
            return Ok(Outcome::NotFound(Item::placeholder(id)));
        };
        let references = item.cover_reference().into_iter().chain(item.metadata.iter().filter_map(MetaData::file_reference));
        for reference in references {
            self.delete_blob(reference).await?;
        }
        self.items.delete(id).await.or_raise(|| ErrorKind::Storage("delete item"))?;
        tracing::info!("permanently deleted item");
        Ok(Outcome::Deleted(item))
    }

    /// Delete a blob; one that is already gone counts as deleted.
    async fn delete_blob(&self, reference: &CoverRef) -> Result<()> {
        match self.blobs.delete(reference).await {
            Ok(()) => Ok(()),
            Err(err) if matches!(&*err, StorageErrorKind::NotFound(_)) => Ok(()),
            Err(err) => Err(err).or_raise(|| ErrorKind::Storage("delete blob")),
        }
    }
}
