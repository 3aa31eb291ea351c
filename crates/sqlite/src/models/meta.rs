use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use shelf_storage::{CoverRef, MetaData, MetaValue};
use time::UtcDateTime;

/// JSON shape of a single metadata entry inside the `metadata` column.
///
/// File-bearing values only keep their blob reference; the bytes live in the
/// blob table. Timestamps are stored as Unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum MetaProxy {
    Number { name: String, value: i32 },
    Text { name: String, value: String },
    DateTime { name: String, value: i64 },
    File { name: String, reference: String },
}
impl From<&MetaData> for MetaProxy {
    fn from(meta: &MetaData) -> Self {
        let name = meta.name.clone();
        match &meta.value {
            MetaValue::Number(value) => Self::Number { name, value: *value },
            MetaValue::Text(value) => Self::Text { name, value: value.clone() },
            MetaValue::DateTime(value) => Self::DateTime { name, value: value.unix_timestamp() },
            MetaValue::File { reference, .. } => Self::File { name, reference: reference.to_string() },
        }
    }
}
impl TryFrom<MetaProxy> for MetaData {
    type Error = Error;
    fn try_from(proxy: MetaProxy) -> Result<Self, Self::Error> {
        Ok(match proxy {
            MetaProxy::Number { name, value } => MetaData::new(name, MetaValue::Number(value)),
            MetaProxy::Text { name, value } => MetaData::new(name, MetaValue::Text(value)),
            MetaProxy::DateTime { name, value } => MetaData::new(
                name,
                MetaValue::DateTime(
                    UtcDateTime::from_unix_timestamp(value).or_raise(|| ErrorKind::InvalidData("metadata timestamp"))?,
                ),
            ),
            MetaProxy::File { name, reference } => {
                MetaData::new(name, MetaValue::File { reference: CoverRef::from(reference), data: None })
            },
        })
    }
}
