use crate::checksum::checksum;
use crate::error::{ErrorKind, Result};
use crate::reference::{RandomReferences, ReferenceGenerator};
use exn::ResultExt;
use shelf_extract::{BookFormat, Extractor};
use shelf_render::Thumbnailer;
use shelf_storage::{CoverImage, Item};
use std::path::Path;
use std::sync::Arc;
use time::UtcDateTime;
use tracing::instrument;

/// Display name given to generated cover thumbnails.
pub const COVER_NAME: &str = "cover.jpg";

/// Turns a document on disk into a new, unsaved [`Item`].
#[derive(Clone)]
pub struct BookCreator {
    extractor: Extractor,
    thumbnailer: Thumbnailer,
    references: Arc<dyn ReferenceGenerator>,
}
impl Default for BookCreator {
    fn default() -> Self {
        Self::new(Extractor::default(), Thumbnailer::default())
    }
}
impl BookCreator {
    pub fn new(extractor: Extractor, thumbnailer: Thumbnailer) -> Self {
        Self { extractor, thumbnailer, references: Arc::new(RandomReferences) }
    }

    pub fn with_references(mut self, references: Arc<dyn ReferenceGenerator>) -> Self {
        self.references = references;
        self
    }

    /// Build an item from a document's bytes.
    ///
    /// The id is the checksum of `bytes`, name and extension come from
    /// `path`. Hashing, cover extraction and thumbnailing happen on a
    /// blocking thread. A document without a cover gets an item without
    /// one; a cover that was found but can't be decoded is an
    /// [`ErrorKind::Thumbnail`] error.
    #[instrument(skip(self, path, bytes), fields(path = %path.display(), size = bytes.len()))]
    pub async fn create(&self, path: &Path, bytes: Vec<u8>) -> Result<Item> {
        let format = BookFormat::from_path(path);
        let extractor = self.extractor.clone();
        let thumbnailer = self.thumbnailer;
        let (id, thumbnail) = tokio::task::spawn_blocking(move || {
            let id = checksum(&bytes);
            let cover = extractor.extract(format, &bytes);
            thumbnailer.resize(&cover).map(|thumbnail| (id, thumbnail))
        })
        .await
        .or_raise(|| ErrorKind::Task)?
        .or_raise(|| ErrorKind::Thumbnail)?;

        let name = path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default();
        let extension = path.extension().map(|ext| ext.to_string_lossy().into_owned()).unwrap_or_default();
        let cover = (!thumbnail.is_empty()).then(|| CoverImage::new(self.references.create(), COVER_NAME, thumbnail));
        tracing::debug!(%id, %format, has_cover = cover.is_some(), "created item");
        Ok(Item::new(id, name, path.to_string_lossy(), extension, UtcDateTime::now()).with_cover(cover))
    }

    /// Read a document from disk and build an item from it.
    pub async fn create_from_file(&self, path: &Path) -> Result<Item> {
        let bytes = tokio::fs::read(path).await.or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
        self.create(path, bytes).await
    }
}
