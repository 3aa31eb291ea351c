//! Collection item model.
//!
//! Items are values: changes are made by building a modified copy with the
//! `with_*` methods and handing it back to the collection to persist.

use crate::{MetaData, Tag};
use derive_more::Display;
use std::collections::BTreeSet;
use time::UtcDateTime;

/// Blob store key for a cover image or a file-bearing metadata value.
///
/// Stable for the whole life of an item, including soft-delete and restore.
#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoverRef(String);

impl CoverRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<String> for CoverRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}
impl From<&str> for CoverRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub reference: CoverRef,
    pub name: String,
    /// Empty when the cover has not been hydrated from the blob store.
    pub data: Vec<u8>,
}

impl CoverImage {
    pub fn new(reference: CoverRef, name: impl Into<String>, data: Vec<u8>) -> Self {
        Self { reference, name: name.into(), data }
    }

    pub fn is_hydrated(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn without_data(&self) -> Self {
        Self { reference: self.reference.clone(), name: self.name.clone(), data: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Content address of the file this item was created from.
    pub id: String,
    pub name: String,
    pub path: String,
    /// File extension without the leading dot, as found on disk.
    pub extension: String,
    pub cover: Option<CoverImage>,
    pub deleted: bool,
    pub read: bool,
    pub tags: BTreeSet<Tag>,
    pub metadata: Vec<MetaData>,
    pub created: UtcDateTime,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
        extension: impl Into<String>,
        created: UtcDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            extension: extension.into(),
            cover: None,
            deleted: false,
            read: false,
            tags: BTreeSet::new(),
            metadata: Vec::new(),
            created,
        }
    }

    /// Stand-in used when an operation refers to an id that isn't stored.
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self::new(id, "", "", "", UtcDateTime::UNIX_EPOCH)
    }

    pub fn cover_reference(&self) -> Option<&CoverRef> {
        self.cover.as_ref().map(|cover| &cover.reference)
    }

    pub fn with_cover(self, cover: Option<CoverImage>) -> Self {
        Self { cover, ..self }
    }

    pub fn with_deleted(self, deleted: bool) -> Self {
        Self { deleted, ..self }
    }

    pub fn with_read(self, read: bool) -> Self {
        Self { read, ..self }
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn without_tag(mut self, tag: &Tag) -> Self {
        self.tags.remove(tag);
        self
    }

    pub fn with_metadata(self, metadata: Vec<MetaData>) -> Self {
        Self { metadata, ..self }
    }

    /// The item as stores hold it: no cover bytes, no metadata file bytes.
    pub fn dehydrated(&self) -> Self {
        Self {
            cover: self.cover.as_ref().map(CoverImage::without_data),
            metadata: self.metadata.iter().map(MetaData::without_data).collect(),
            ..self.clone()
        }
    }
}
