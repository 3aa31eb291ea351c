//! In-memory BMP container over a raw 32-bit pixel buffer.
//!
//! Rasterizers hand back bare pixel memory (width, height, stride, BGRA
//! bytes) that general-purpose image decoders can't consume. [`BmpStream`]
//! presents that buffer as a complete BMP file without copying the pixels up
//! front: the 122-byte header is generated once, and pixel bytes are copied
//! out of the source buffer only as they are read.

use crate::error::{ErrorKind, Result};
use std::io::{self, Read, Seek, SeekFrom};

pub const FILE_HEADER_SIZE: usize = 14;
/// `BITMAPV4HEADER`
pub const INFO_HEADER_SIZE: usize = 108;
/// Offset of the pixel array.
pub const HEADER_SIZE: usize = FILE_HEADER_SIZE + INFO_HEADER_SIZE;

const BYTES_PER_PIXEL: usize = 4;
const BITS_PER_PIXEL: u16 = 32;
const BI_BITFIELDS: u32 = 3;
const METERS_PER_INCH: f64 = 0.0254;

const RED_MASK: u32 = 0x00FF_0000;
const GREEN_MASK: u32 = 0x0000_FF00;
const BLUE_MASK: u32 = 0x0000_00FF;
const ALPHA_MASK: u32 = 0xFF00_0000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BmpOptions {
    pub dpi_x: f64,
    pub dpi_y: f64,
    /// Declare the fourth byte of every pixel as alpha.
    pub alpha: bool,
}
impl Default for BmpOptions {
    fn default() -> Self {
        Self { dpi_x: 72.0, dpi_y: 72.0, alpha: true }
    }
}

/// Row length of the pixel array in the BMP file: bits per row rounded up to
/// a multiple of 32, in bytes.
pub fn target_stride(width: u32) -> usize {
    (((BITS_PER_PIXEL as usize) * width as usize + 31) / 32) * 4
}

/// Read-only, seekable BMP file over an owned pixel buffer.
///
/// The buffer is expected to hold top-down rows of little-endian BGRA pixels
/// (blue in the lowest byte), `stride` bytes apart. It is released when the
/// stream is dropped, or handed back by [`into_inner()`](Self::into_inner).
///
/// # Examples
///
/// ```
/// use shelf_render::BmpStream;
/// use std::io::Read;
///
/// // 2x1 image: one blue pixel, one red pixel.
/// let pixels = vec![255, 0, 0, 255, 0, 0, 255, 255];
/// let mut stream = BmpStream::new(pixels, 2, 1, 8).unwrap();
/// let mut file = Vec::new();
/// stream.read_to_end(&mut file).unwrap();
/// assert_eq!(&file[..2], b"BM");
/// assert_eq!(file.len() as u64, stream.file_size());
/// ```
pub struct BmpStream<B> {
    header: [u8; HEADER_SIZE],
    pixels: B,
    height: usize,
    row_length: usize,
    source_stride: usize,
    target_stride: usize,
    position: u64,
}

impl<B: AsRef<[u8]>> BmpStream<B> {
    /// Wrap a pixel buffer using 72 DPI and an alpha channel.
    pub fn new(pixels: B, width: u32, height: u32, stride: usize) -> Result<Self> {
        Self::with_options(pixels, width, height, stride, BmpOptions::default())
    }

    pub fn with_options(pixels: B, width: u32, height: u32, stride: usize, options: BmpOptions) -> Result<Self> {
        if width == 0 || height == 0 {
            exn::bail!(ErrorKind::InvalidBitmap("dimensions must be non-zero"));
        }
        let signed_width = i32::try_from(width).ok();
        let signed_height = i32::try_from(height).ok();
        let (Some(signed_width), Some(signed_height)) = (signed_width, signed_height) else {
            exn::bail!(ErrorKind::InvalidBitmap("dimensions too large"));
        };
        let row_length = BYTES_PER_PIXEL * width as usize;
        if stride < row_length {
            exn::bail!(ErrorKind::InvalidBitmap("stride is shorter than a row of pixels"));
        }
        let target_stride = target_stride(width);
        let pixel_bytes = target_stride
            .checked_mul(height as usize)
            .and_then(|size| u32::try_from(size).ok())
            .and_then(|size| size.checked_add(HEADER_SIZE as u32));
        let Some(file_size) = pixel_bytes else {
            exn::bail!(ErrorKind::InvalidBitmap("bitmap too large for a BMP file"));
        };
        let required = stride.checked_mul(height as usize);
        if required.is_none_or(|required| pixels.as_ref().len() < required) {
            exn::bail!(ErrorKind::InvalidBitmap("pixel buffer is shorter than stride * height"));
        }

        Ok(Self {
            header: header(file_size, signed_width, signed_height, options),
            pixels,
            height: height as usize,
            row_length,
            source_stride: stride,
            target_stride,
            position: 0,
        })
    }

    /// Total length of the BMP file in bytes.
    pub fn file_size(&self) -> u64 {
        (HEADER_SIZE + self.target_stride * self.height) as u64
    }

    pub fn into_inner(self) -> B {
        self.pixels
    }

    /// Copy bytes at the current position into `out`, never crossing a
    /// header/row/padding boundary. Returns 0 at or past the end.
    fn read_chunk(&self, out: &mut [u8]) -> usize {
        if self.position >= self.file_size() {
            return 0;
        }
        // Bounded by the file size, which fits in a u32.
        let position = self.position as usize;
        if position < HEADER_SIZE {
            let n = out.len().min(HEADER_SIZE - position);
            out[..n].copy_from_slice(&self.header[position..position + n]);
            return n;
        }

        let offset = position - HEADER_SIZE;
        let pixels = self.pixels.as_ref();
        if self.source_stride == self.target_stride {
            let n = out.len().min(self.target_stride * self.height - offset);
            out[..n].copy_from_slice(&pixels[offset..offset + n]);
            return n;
        }

        let row = offset / self.target_stride;
        let column = offset % self.target_stride;
        if column < self.row_length {
            let n = out.len().min(self.row_length - column);
            let start = row * self.source_stride + column;
            out[..n].copy_from_slice(&pixels[start..start + n]);
            n
        } else {
            let n = out.len().min(self.target_stride - column);
            out[..n].fill(0);
            n
        }
    }
}

impl<B: AsRef<[u8]>> Read for BmpStream<B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.read_chunk(&mut buf[written..]);
            if n == 0 {
                break;
            }
            written += n;
            self.position += n as u64;
        }
        Ok(written)
    }
}

impl<B: AsRef<[u8]>> Seek for BmpStream<B> {
    /// Seeking past the end is allowed (subsequent reads return 0 bytes);
    /// seeking before the start is an [`InvalidInput`](io::ErrorKind::InvalidInput) error.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(position) => Some(position),
            SeekFrom::End(delta) => self.file_size().checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };
        let Some(target) = target else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative or overflowing position"));
        };
        self.position = target;
        Ok(target)
    }
}

struct HeaderWriter<'a> {
    buf: &'a mut [u8; HEADER_SIZE],
    at: usize,
}
impl HeaderWriter<'_> {
    fn put(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf[self.at..self.at + bytes.len()].copy_from_slice(bytes);
        self.at += bytes.len();
        self
    }
}

fn pixels_per_meter(dpi: f64) -> i32 {
    (dpi / METERS_PER_INCH).round() as i32
}

fn header(file_size: u32, width: i32, height: i32, options: BmpOptions) -> [u8; HEADER_SIZE] {
    let mut buf = [0u8; HEADER_SIZE];
    let alpha_mask = if options.alpha { ALPHA_MASK } else { 0 };
    HeaderWriter { buf: &mut buf, at: 0 }
        // BITMAPFILEHEADER
        .put(b"BM")
        .put(&file_size.to_le_bytes())
        .put(&0u32.to_le_bytes())
        .put(&(HEADER_SIZE as u32).to_le_bytes())
        // BITMAPV4HEADER
        .put(&(INFO_HEADER_SIZE as u32).to_le_bytes())
        .put(&width.to_le_bytes())
        // Negative height: rows are stored top-down.
        .put(&(-height).to_le_bytes())
        .put(&1u16.to_le_bytes())
        .put(&BITS_PER_PIXEL.to_le_bytes())
        .put(&BI_BITFIELDS.to_le_bytes())
        .put(&0u32.to_le_bytes())
        .put(&pixels_per_meter(options.dpi_x).to_le_bytes())
        .put(&pixels_per_meter(options.dpi_y).to_le_bytes())
        .put(&0u32.to_le_bytes())
        .put(&0u32.to_le_bytes())
        .put(&RED_MASK.to_le_bytes())
        .put(&GREEN_MASK.to_le_bytes())
        .put(&BLUE_MASK.to_le_bytes())
        .put(&alpha_mask.to_le_bytes());
    // Colour space type, endpoints and gamma stay zeroed.
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn i32_at(bytes: &[u8], at: usize) -> i32 {
        i32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn read_all<B: AsRef<[u8]>>(stream: &mut BmpStream<B>) -> Vec<u8> {
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        out
    }

    /// Every byte of the buffer is distinct-ish so misplaced copies show up.
    fn gradient(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_header_fields() {
        let mut stream = BmpStream::new(gradient(3 * 2 * 4), 3, 2, 12).unwrap();
        let file = read_all(&mut stream);
        assert_eq!(&file[0..2], b"BM");
        assert_eq!(u32_at(&file, 2), 122 + 12 * 2);
        assert_eq!(u32_at(&file, 6), 0);
        assert_eq!(u32_at(&file, 10), 122);
        assert_eq!(u32_at(&file, 14), 108);
        assert_eq!(i32_at(&file, 18), 3);
        assert_eq!(i32_at(&file, 22), -2);
        assert_eq!(u16::from_le_bytes([file[26], file[27]]), 1);
        assert_eq!(u16::from_le_bytes([file[28], file[29]]), 32);
        assert_eq!(u32_at(&file, 30), 3);
        assert_eq!(u32_at(&file, 34), 0);
        assert_eq!(i32_at(&file, 38), 2835);
        assert_eq!(i32_at(&file, 42), 2835);
        assert_eq!(u32_at(&file, 54), 0x00FF_0000);
        assert_eq!(u32_at(&file, 58), 0x0000_FF00);
        assert_eq!(u32_at(&file, 62), 0x0000_00FF);
        assert_eq!(u32_at(&file, 66), 0xFF00_0000);
        assert!(file[70..122].iter().all(|b| *b == 0));
    }

    #[rstest]
    #[case(72.0, 2835)]
    #[case(96.0, 3780)]
    #[case(300.0, 11811)]
    fn test_resolution(#[case] dpi: f64, #[case] expected: i32) {
        let options = BmpOptions { dpi_x: dpi, dpi_y: dpi, alpha: true };
        let mut stream = BmpStream::with_options(vec![0u8; 4], 1, 1, 4, options).unwrap();
        let file = read_all(&mut stream);
        assert_eq!(i32_at(&file, 38), expected);
        assert_eq!(i32_at(&file, 42), expected);
    }

    #[test]
    fn test_without_alpha() {
        let options = BmpOptions { alpha: false, ..BmpOptions::default() };
        let mut stream = BmpStream::with_options(vec![0u8; 4], 1, 1, 4, options).unwrap();
        assert_eq!(u32_at(&read_all(&mut stream), 66), 0);
    }

    #[test]
    fn test_file_size_of_rasterized_page() {
        let stream = BmpStream::new(vec![0u8; 1600 * 600], 400, 600, 1600).unwrap();
        assert_eq!(stream.file_size(), 14 + 108 + 1600 * 600);
    }

    #[test]
    fn test_contiguous_pixels() {
        let pixels = gradient(4 * 4 * 3);
        let mut stream = BmpStream::new(pixels.clone(), 4, 3, 16).unwrap();
        let file = read_all(&mut stream);
        assert_eq!(file.len() as u64, stream.file_size());
        assert_eq!(&file[HEADER_SIZE..], pixels.as_slice());
    }

    #[test]
    fn test_source_padding_is_skipped() {
        // Two pixels per row, rows padded to 12 bytes in the source.
        let mut pixels = Vec::new();
        for row in 0..3u8 {
            pixels.extend_from_slice(&[row, row, row, 255, row + 10, row + 10, row + 10, 255]);
            pixels.extend_from_slice(&[0xEE; 4]);
        }
        let mut stream = BmpStream::new(pixels, 2, 3, 12).unwrap();
        let file = read_all(&mut stream);
        let body = &file[HEADER_SIZE..];
        assert_eq!(body.len(), 8 * 3);
        assert!(!body.contains(&0xEE));
        assert_eq!(&body[8..16], &[1, 1, 1, 255, 11, 11, 11, 255]);
    }

    #[test]
    fn test_small_reads_match_one_read() {
        let pixels = gradient(5 * 4 * 7 + 7 * 4);
        let mut whole = BmpStream::new(pixels.clone(), 5, 7, 24).unwrap();
        let expected = read_all(&mut whole);

        let mut chunked = BmpStream::new(pixels, 5, 7, 24).unwrap();
        let mut actual = Vec::new();
        let mut buf = [0u8; 7];
        loop {
            let n = chunked.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            actual.extend_from_slice(&buf[..n]);
        }
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_rereading_after_seek() {
        let mut stream = BmpStream::new(gradient(64), 4, 4, 16).unwrap();
        let first = read_all(&mut stream);
        assert_eq!(stream.seek(SeekFrom::Start(0)).unwrap(), 0);
        let second = read_all(&mut stream);
        assert_eq!(first, second);
    }

    #[test]
    fn test_seek_variants() {
        let mut stream = BmpStream::new(gradient(16), 2, 2, 8).unwrap();
        assert_eq!(stream.seek(SeekFrom::End(-4)).unwrap(), stream.file_size() - 4);
        assert_eq!(stream.seek(SeekFrom::Current(-2)).unwrap(), stream.file_size() - 6);
        let mut buf = [0u8; 16];
        assert_eq!(stream.read(&mut buf).unwrap(), 6);
        // Reading from the middle of the header.
        stream.seek(SeekFrom::Start(1)).unwrap();
        assert_eq!(stream.read(&mut buf[..1]).unwrap(), 1);
        assert_eq!(buf[0], b'M');
    }

    #[test]
    fn test_seek_before_start_is_rejected() {
        let mut stream = BmpStream::new(gradient(16), 2, 2, 8).unwrap();
        stream.seek(SeekFrom::Start(10)).unwrap();
        let err = stream.seek(SeekFrom::Current(-11)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        let err = stream.seek(SeekFrom::End(-1000)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        // Position is unchanged by a rejected seek.
        assert_eq!(stream.stream_position().unwrap(), 10);
    }

    #[test]
    fn test_seek_past_end_reads_nothing() {
        let mut stream = BmpStream::new(gradient(16), 2, 2, 8).unwrap();
        let end = stream.file_size();
        assert_eq!(stream.seek(SeekFrom::Start(end + 100)).unwrap(), end + 100);
        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[rstest]
    #[case(0, 1, 4, 4)]
    #[case(1, 0, 4, 4)]
    #[case(2, 1, 7, 8)]
    #[case(2, 2, 8, 15)]
    fn test_invalid_bitmaps(#[case] width: u32, #[case] height: u32, #[case] stride: usize, #[case] len: usize) {
        let err = BmpStream::new(vec![0u8; len], width, height, stride).err().unwrap();
        assert!(matches!(&*err, ErrorKind::InvalidBitmap(_)));
    }

    #[test]
    fn test_decodes_as_bmp() {
        // BGRA: blue, green / red, white
        let pixels = vec![
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 255, 255, 255, 255,
        ];
        let stream = BmpStream::new(pixels, 2, 2, 8).unwrap();
        let image = image::load(io::BufReader::new(stream), image::ImageFormat::Bmp).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 255, 0]);
        assert_eq!(image.get_pixel(0, 1).0, [255, 0, 0]);
        assert_eq!(image.get_pixel(1, 1).0, [255, 255, 255]);
    }

    #[test]
    fn test_into_inner_returns_buffer() {
        let pixels = gradient(16);
        let stream = BmpStream::new(pixels.clone(), 2, 2, 8).unwrap();
        assert_eq!(stream.into_inner(), pixels);
    }
}
