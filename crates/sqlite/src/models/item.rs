/// One row of the `items` table, exactly as SQLite holds it.
///
/// Turning rows into [`Item`](shelf_storage::Item)s and back is the job of an
/// [`ItemCodec`](crate::ItemCodec).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ItemRow {
    pub id: String,
    pub name: String,
    pub path: String,
    pub extension: String,
    pub cover_ref: Option<String>,
    pub cover_name: Option<String>,
    pub is_deleted: bool,
    pub is_read: bool,
    pub tags: String,
    pub metadata: String,
    pub created_at: i64,
}
