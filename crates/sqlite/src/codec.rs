//! Explicit row <-> item conversion rules.
//!
//! Stores are handed a codec when they are constructed instead of relying on
//! any process-wide registration, so two stores in the same process can
//! encode records differently.

use crate::error::{ErrorKind, Result};
use crate::models::{ItemRow, MetaProxy};
use exn::ResultExt;
use shelf_storage::{CoverImage, CoverRef, Item, MetaData, Tag};
use std::collections::BTreeSet;
use time::UtcDateTime;

pub trait ItemCodec: Send + Sync {
    /// Encode an item for storage. Cover and metadata file bytes are dropped.
    fn encode(&self, item: &Item) -> Result<ItemRow>;
    /// Decode a stored row. Covers come back with empty `data`.
    fn decode(&self, row: ItemRow) -> Result<Item>;
}

/// Default codec: tags and metadata as JSON arrays, timestamps as Unix seconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl ItemCodec for JsonCodec {
    fn encode(&self, item: &Item) -> Result<ItemRow> {
        let tags: Vec<&str> = item.tags.iter().map(Tag::as_str).collect();
        let metadata: Vec<MetaProxy> = item.metadata.iter().map(MetaProxy::from).collect();
        Ok(ItemRow {
            id: item.id.clone(),
            name: item.name.clone(),
            path: item.path.clone(),
            extension: item.extension.clone(),
            cover_ref: item.cover.as_ref().map(|cover| cover.reference.to_string()),
            cover_name: item.cover.as_ref().map(|cover| cover.name.clone()),
            is_deleted: item.deleted,
            is_read: item.read,
            tags: serde_json::to_string(&tags).or_raise(|| ErrorKind::InvalidData("tags"))?,
            metadata: serde_json::to_string(&metadata).or_raise(|| ErrorKind::InvalidData("metadata"))?,
            created_at: item.created.unix_timestamp(),
        })
    }

    fn decode(&self, row: ItemRow) -> Result<Item> {
        let tags: Vec<String> = serde_json::from_str(&row.tags).or_raise(|| ErrorKind::InvalidData("tags"))?;
        let tags = tags
            .into_iter()
            .map(Tag::try_from)
            .collect::<std::result::Result<BTreeSet<_>, _>>()
            .or_raise(|| ErrorKind::InvalidData("tags"))?;
        let metadata: Vec<MetaProxy> =
            serde_json::from_str(&row.metadata).or_raise(|| ErrorKind::InvalidData("metadata"))?;
        let metadata = metadata.into_iter().map(MetaData::try_from).collect::<Result<Vec<_>>>()?;
        let cover = match (row.cover_ref, row.cover_name) {
            (Some(reference), name) => {
                Some(CoverImage::new(CoverRef::from(reference), name.unwrap_or_default(), Vec::new()))
            },
            (None, _) => None,
        };
        Ok(Item {
            id: row.id,
            name: row.name,
            path: row.path,
            extension: row.extension,
            cover,
            deleted: row.is_deleted,
            read: row.is_read,
            tags,
            metadata,
            created: UtcDateTime::from_unix_timestamp(row.created_at)
                .or_raise(|| ErrorKind::InvalidData("creation date"))?,
        })
    }
}
