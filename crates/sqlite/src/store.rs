//! [`ItemStore`] and [`BlobStore`] backed by the collection database.

use crate::codec::{ItemCodec, JsonCodec};
use crate::error::{ErrorKind, Result};
use crate::models::ItemRow;
use crate::Database;
use async_trait::async_trait;
use exn::ResultExt;
use shelf_storage::error::{ErrorKind as StorageErrorKind, Result as StorageResult};
use shelf_storage::{Blob, BlobStore, CoverRef, Item, ItemStore};
use sqlx::SqlitePool;
use std::sync::Arc;
use time::UtcDateTime;

fn backend(name: &str) -> impl FnOnce() -> StorageErrorKind + '_ {
    move || StorageErrorKind::Backend(name.to_string())
}

/// Item records in the `items` table.
#[derive(Clone)]
pub struct SqliteItemStore {
    pool: SqlitePool,
    codec: Arc<dyn ItemCodec>,
    name: String,
}
impl From<&Database> for SqliteItemStore {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone(), Arc::new(JsonCodec))
    }
}
impl SqliteItemStore {
    pub fn new(pool: SqlitePool, codec: Arc<dyn ItemCodec>) -> Self {
        Self { pool, codec, name: "sqlite".to_string() }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    async fn fetch_one(&self, id: &str) -> Result<Option<Item>> {
        let row: Option<ItemRow> = sqlx::query_as(include_str!("../queries/get_item.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(|row| self.codec.decode(row)).transpose()
    }

    async fn fetch_many(&self, query: &'static str, prefix: Option<&str>) -> Result<Vec<Item>> {
        let mut query = sqlx::query_as::<_, ItemRow>(query);
        if let Some(prefix) = prefix {
            query = query.bind(prefix);
        }
        let rows = query.fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(|row| self.codec.decode(row)).collect()
    }

    /// Returns the number of rows written.
    async fn write(&self, query: &'static str, item: &Item) -> Result<u64> {
        let row = self.codec.encode(item)?;
        let result = sqlx::query(query)
            .bind(row.id)
            .bind(row.name)
            .bind(row.path)
            .bind(row.extension)
            .bind(row.cover_ref)
            .bind(row.cover_name)
            .bind(row.is_deleted)
            .bind(row.is_read)
            .bind(row.tags)
            .bind(row.metadata)
            .bind(row.created_at)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }

    async fn remove(&self, id: &str) -> Result<u64> {
        let result = sqlx::query(include_str!("../queries/delete_item.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, id: &str) -> StorageResult<Option<Item>> {
        self.fetch_one(id).await.or_raise(backend(&self.name))
    }

    async fn get_all(&self) -> StorageResult<Vec<Item>> {
        self.fetch_many(include_str!("../queries/list_items.sql"), None).await.or_raise(backend(&self.name))
    }

    async fn find_by_prefix(&self, prefix: &str) -> StorageResult<Vec<Item>> {
        self.fetch_many(include_str!("../queries/find_items.sql"), Some(prefix)).await.or_raise(backend(&self.name))
    }

    async fn insert(&self, item: &Item) -> StorageResult<()> {
        let written =
            self.write(include_str!("../queries/insert_item.sql"), item).await.or_raise(backend(&self.name))?;
        if written == 0 {
            exn::bail!(StorageErrorKind::AlreadyExists(item.id.clone()));
        }
        Ok(())
    }

    async fn upsert(&self, item: &Item) -> StorageResult<()> {
        self.write(include_str!("../queries/upsert_item.sql"), item).await.or_raise(backend(&self.name))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> StorageResult<()> {
        if self.remove(id).await.or_raise(backend(&self.name))? == 0 {
            exn::bail!(StorageErrorKind::NotFound(id.to_string()));
        }
        Ok(())
    }
}

/// Cover images and metadata files in the `blobs` table.
#[derive(Debug, Clone)]
pub struct SqliteBlobStore {
    pool: SqlitePool,
}
impl From<&Database> for SqliteBlobStore {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}
impl SqliteBlobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn execute(&self, query: &'static str, reference: &CoverRef, args: BlobArgs<'_>) -> Result<u64> {
        let now = UtcDateTime::now().unix_timestamp();
        let query = sqlx::query(query).bind(reference.as_str());
        let query = match args {
            BlobArgs::Insert { name, data } => query.bind(name).bind(data).bind(now),
            BlobArgs::Update { data } => query.bind(data).bind(now),
            BlobArgs::Key => query,
        };
        let result = query.execute(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }

    async fn fetch(&self, reference: &CoverRef) -> Result<Option<Blob>> {
        let row: Option<(String, Vec<u8>)> = sqlx::query_as(include_str!("../queries/get_blob.sql"))
            .bind(reference.as_str())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.map(|(name, data)| Blob { name, data }))
    }

    async fn exists(&self, reference: &CoverRef) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(include_str!("../queries/blob_exists.sql"))
            .bind(reference.as_str())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(exists)
    }
}

enum BlobArgs<'a> {
    Insert { name: &'a str, data: &'a [u8] },
    Update { data: &'a [u8] },
    Key,
}

const BLOB_BACKEND: &str = "sqlite blobs";

#[async_trait]
impl BlobStore for SqliteBlobStore {
    async fn add(&self, reference: &CoverRef, name: &str, data: &[u8]) -> StorageResult<()> {
        let written = self
            .execute(include_str!("../queries/insert_blob.sql"), reference, BlobArgs::Insert { name, data })
            .await
            .or_raise(backend(BLOB_BACKEND))?;
        if written == 0 {
            exn::bail!(StorageErrorKind::AlreadyExists(reference.to_string()));
        }
        Ok(())
    }

    async fn update(&self, reference: &CoverRef, data: &[u8]) -> StorageResult<()> {
        let written = self
            .execute(include_str!("../queries/update_blob.sql"), reference, BlobArgs::Update { data })
            .await
            .or_raise(backend(BLOB_BACKEND))?;
        if written == 0 {
            exn::bail!(StorageErrorKind::NotFound(reference.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, reference: &CoverRef) -> StorageResult<()> {
        let written = self
            .execute(include_str!("../queries/delete_blob.sql"), reference, BlobArgs::Key)
            .await
            .or_raise(backend(BLOB_BACKEND))?;
        if written == 0 {
            exn::bail!(StorageErrorKind::NotFound(reference.to_string()));
        }
        Ok(())
    }

    async fn get(&self, reference: &CoverRef) -> StorageResult<Option<Blob>> {
        self.fetch(reference).await.or_raise(backend(BLOB_BACKEND))
    }

    async fn contains(&self, reference: &CoverRef) -> StorageResult<bool> {
        self.exists(reference).await.or_raise(backend(BLOB_BACKEND))
    }
}
