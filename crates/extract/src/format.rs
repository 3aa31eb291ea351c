use derive_more::Display;
use std::path::Path;

/// Document formats with a dedicated cover extractor.
///
/// Everything else maps to [`BookFormat::Default`], which never has a cover.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BookFormat {
    #[default]
    #[display("default")]
    Default,
    #[display("fb2")]
    Fb2,
    #[display("epub")]
    Epub,
    #[display("pdf")]
    Pdf,
}

impl BookFormat {
    /// Case-insensitive; accepts the extension with or without its leading dot.
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        match extension.trim_start_matches('.').to_lowercase().as_str() {
            "fb2" => BookFormat::Fb2,
            "epub" => BookFormat::Epub,
            "pdf" => BookFormat::Pdf,
            _ => BookFormat::Default,
        }
    }

    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(BookFormat::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("fb2", BookFormat::Fb2)]
    #[case("FB2", BookFormat::Fb2)]
    #[case(".epub", BookFormat::Epub)]
    #[case("EPub", BookFormat::Epub)]
    #[case("pdf", BookFormat::Pdf)]
    #[case("mobi", BookFormat::Default)]
    #[case("", BookFormat::Default)]
    fn test_from_extension(#[case] extension: &str, #[case] expected: BookFormat) {
        assert_eq!(BookFormat::from_extension(extension), expected);
    }

    #[rstest]
    #[case("/books/Dune.EPUB", BookFormat::Epub)]
    #[case("war-and-peace.fb2", BookFormat::Fb2)]
    #[case("paper.final.pdf", BookFormat::Pdf)]
    #[case("notes.txt", BookFormat::Default)]
    #[case("README", BookFormat::Default)]
    // A dotfile has no extension.
    #[case(".pdf", BookFormat::Default)]
    // Compressed documents are not opened.
    #[case("book.fb2.zip", BookFormat::Default)]
    fn test_from_path(#[case] path: &str, #[case] expected: BookFormat) {
        assert_eq!(BookFormat::from_path(path), expected);
    }
}
