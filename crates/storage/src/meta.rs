//! Legacy typed metadata entries.
//!
//! Items created by older front-ends carry free-form `name = value` pairs
//! instead of tags. File-bearing values keep their bytes in the blob store,
//! the same way covers do.

use crate::CoverRef;
use time::UtcDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Number(i32),
    Text(String),
    DateTime(UtcDateTime),
    /// Bytes live in the blob store under `reference`; `data` is only
    /// populated while the value is on its way in.
    File { reference: CoverRef, data: Option<Vec<u8>> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaData {
    pub name: String,
    pub value: MetaValue,
}

impl MetaData {
    pub fn new(name: impl Into<String>, value: MetaValue) -> Self {
        Self { name: name.into(), value }
    }

    /// Blob reference for file-bearing values.
    pub fn file_reference(&self) -> Option<&CoverRef> {
        match &self.value {
            MetaValue::File { reference, .. } => Some(reference),
            _ => None,
        }
    }

    /// Same entry with any in-flight file bytes removed, as persisted records hold it.
    pub fn without_data(&self) -> Self {
        match &self.value {
            MetaValue::File { reference, .. } => Self {
                name: self.name.clone(),
                value: MetaValue::File { reference: reference.clone(), data: None },
            },
            _ => self.clone(),
        }
    }
}
