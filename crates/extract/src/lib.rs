//! Cover extraction.
//!
//! Pick a [`BookFormat`] from the file name, then hand the document bytes to
//! an [`Extractor`]. Extraction never fails: a document without a usable
//! cover produces empty bytes, and anything unexpected along the way is
//! logged as a warning.

mod epub;
pub mod error;
mod fb2;
mod format;

use exn::ResultExt;
use shelf_render::PdfRasterizer;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
pub use crate::format::BookFormat;

#[derive(Debug, Clone, Default)]
pub struct Extractor {
    pdf: PdfRasterizer,
}

impl Extractor {
    pub fn new(pdf: PdfRasterizer) -> Self {
        Self { pdf }
    }

    /// Raw cover image bytes, in whatever format the document stores them
    /// (PDF covers come out as JPEG). Empty when there is no cover.
    #[instrument(skip(self, bytes), fields(size = bytes.len(), cover_size = tracing::field::Empty))]
    pub fn extract(&self, format: BookFormat, bytes: &[u8]) -> Vec<u8> {
        match self.try_extract(format, bytes) {
            Ok(cover) => {
                tracing::Span::current().record("cover_size", cover.len());
                cover
            },
            Err(err) => {
                tracing::warn!(%format, error = ?err, "cover extraction failed, continuing without a cover");
                Vec::new()
            },
        }
    }

    fn try_extract(&self, format: BookFormat, bytes: &[u8]) -> Result<Vec<u8>> {
        match format {
            BookFormat::Default => Ok(Vec::new()),
            BookFormat::Fb2 => fb2::cover(bytes),
            BookFormat::Epub => epub::cover(bytes),
            BookFormat::Pdf => self.pdf.cover(bytes).or_raise(|| ErrorKind::Pdf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BookFormat::Default, b"anything at all".as_slice())]
    #[case(BookFormat::Fb2, b"<FictionBook><unclosed></FictionBook>".as_slice())]
    #[case(BookFormat::Epub, b"PK\x03\x04 truncated".as_slice())]
    #[case(BookFormat::Pdf, b"%PDF-1.7 truncated".as_slice())]
    fn test_failures_degrade_to_empty(#[case] format: BookFormat, #[case] bytes: &[u8]) {
        assert!(Extractor::default().extract(format, bytes).is_empty());
    }

    #[test]
    fn test_epub_cover() {
        let bytes = crate::epub::tests::epub(Some(b"\xFF\xD8\xFF jpeg"));
        assert_eq!(Extractor::default().extract(BookFormat::Epub, &bytes), b"\xFF\xD8\xFF jpeg");
    }

    #[test]
    fn test_fb2_cover() {
        let xml = br##"<FictionBook xmlns:l="http://www.w3.org/1999/xlink">
            <description><title-info><coverpage><image l:href="#c"/></coverpage></title-info></description>
            <binary id="c">Y292ZXI=</binary>
        </FictionBook>"##;
        assert_eq!(Extractor::default().extract(BookFormat::Fb2, xml), b"cover");
    }
}
