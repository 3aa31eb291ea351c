//! Cover image encoding.
//!
//! - [`BmpStream`]: presents raw 32-bit pixel memory as a seekable BMP file.
//! - [`Thumbnailer`]: decode, scale to a bounding size, re-encode as JPEG.
//! - [`PdfRasterizer`]: first page of a PDF document as a JPEG image.

pub mod bmp;
pub mod error;
mod pdf;
mod thumbnail;

pub use crate::bmp::{BmpOptions, BmpStream};
pub use crate::pdf::{DEFAULT_PDF_SCALE, PdfRasterizer, RawBitmap, bitmap_to_jpeg};
pub use crate::thumbnail::{DEFAULT_THUMBNAIL_SIZE, Thumbnailer, encode_jpeg, flatten};
