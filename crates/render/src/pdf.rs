//! First-page PDF covers.
//!
//! pdfium rasterizes into bare BGRA memory; the buffer is wrapped in a
//! [`BmpStream`] so the regular image decoder can read it, then flattened
//! onto white and encoded as JPEG. Rasterizing needs the `pdf` feature and a
//! pdfium shared library at runtime.

use crate::bmp::BmpStream;
use crate::error::{ErrorKind, Result};
use crate::thumbnail::encode_jpeg;
use exn::ResultExt;
use image::ImageFormat;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::instrument;

pub const DEFAULT_PDF_SCALE: f32 = 2.0;

/// Raw pixel memory as returned by the rasterizer.
#[derive(Debug)]
pub struct RawBitmap {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub stride: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfRasterizer {
    scale: f32,
    /// Directory holding the pdfium shared library; `None` searches the
    /// system library path.
    library: Option<PathBuf>,
}
impl Default for PdfRasterizer {
    fn default() -> Self {
        Self { scale: DEFAULT_PDF_SCALE, library: None }
    }
}
impl PdfRasterizer {
    pub fn new(scale: f32, library: Option<PathBuf>) -> Self {
        Self { scale, library }
    }

    /// Render page 1 of a PDF document as a JPEG image.
    #[instrument(skip(self, bytes), fields(pdf_size = bytes.len()))]
    pub fn cover(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let bitmap = self.rasterize(bytes)?;
        bitmap_to_jpeg(bitmap)
    }

    #[cfg(feature = "pdf")]
    fn rasterize(&self, bytes: &[u8]) -> Result<RawBitmap> {
        use pdfium_render::prelude::{PdfColor, PdfRenderConfig, Pdfium};

        let bindings = match &self.library {
            Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
            None => Pdfium::bind_to_system_library(),
        }
        .or_raise(|| ErrorKind::PdfUnavailable)?;
        let pdfium = Pdfium::new(bindings);
        let document = pdfium.load_pdf_from_byte_slice(bytes, None).or_raise(|| ErrorKind::PdfRender)?;
        let page = document.pages().first().or_raise(|| ErrorKind::PdfRender)?;
        let config = PdfRenderConfig::new().scale_page_by_factor(self.scale).set_clear_color(PdfColor::WHITE);
        let bitmap = page.render_with_config(&config).or_raise(|| ErrorKind::PdfRender)?;
        let width = u32::try_from(bitmap.width()).or_raise(|| ErrorKind::PdfRender)?;
        let height = u32::try_from(bitmap.height()).or_raise(|| ErrorKind::PdfRender)?;
        let pixels = bitmap.as_raw_bytes().to_vec();
        if height == 0 {
            exn::bail!(ErrorKind::PdfRender);
        }
        let stride = pixels.len() / height as usize;
        tracing::debug!(width, height, stride, "rasterized first page");
        Ok(RawBitmap { pixels, width, height, stride })
    }

    #[cfg(not(feature = "pdf"))]
    fn rasterize(&self, _bytes: &[u8]) -> Result<RawBitmap> {
        exn::bail!(ErrorKind::PdfUnavailable)
    }
}

/// Decode raw BGRA memory through an in-memory BMP and re-encode as JPEG.
///
/// The pixel buffer moves into the stream and is freed when decoding is done,
/// on success and failure alike.
pub fn bitmap_to_jpeg(bitmap: RawBitmap) -> Result<Vec<u8>> {
    let stream = BmpStream::new(bitmap.pixels, bitmap.width, bitmap.height, bitmap.stride)?;
    let image = image::load(BufReader::new(stream), ImageFormat::Bmp).or_raise(|| ErrorKind::Decode)?;
    encode_jpeg(&image)
}
