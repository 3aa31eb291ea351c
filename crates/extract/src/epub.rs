use crate::error::{ErrorKind, Result};
use epub::doc::EpubDoc;
use exn::ResultExt;
use std::io::Cursor;

/// Returns the cover image declared by the package document, or empty bytes
/// if there isn't one.
pub(crate) fn cover(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut doc = EpubDoc::from_reader(Cursor::new(bytes)).or_raise(|| ErrorKind::Epub)?;
    Ok(doc.get_cover().map(|(data, _mime)| data).unwrap_or_default())
}
