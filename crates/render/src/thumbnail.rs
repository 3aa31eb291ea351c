use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tracing::instrument;

pub const DEFAULT_THUMBNAIL_SIZE: u32 = 100;

/// Normalizes cover images to a fixed bounding size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thumbnailer {
    size: u32,
}
impl Default for Thumbnailer {
    fn default() -> Self {
        Self { size: DEFAULT_THUMBNAIL_SIZE }
    }
}
impl Thumbnailer {
    /// A `size` of zero is bumped to one.
    pub fn new(size: u32) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Dimensions that bring the larger side to `size`, keeping the aspect
    /// ratio. The smaller side is rounded half away from zero, minimum 1.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = |side: u32, longest: u32| -> u32 {
            let scaled = (f64::from(side) * f64::from(self.size) / f64::from(longest)).round();
            (scaled as u32).max(1)
        };
        if width >= height {
            (self.size, scale(height, width))
        } else {
            (scale(width, height), self.size)
        }
    }

    /// Decode an image in any enabled format, scale it to fit and re-encode
    /// it as JPEG.
    ///
    /// Empty input means "no cover" and produces empty output without
    /// attempting a decode. Anything else that fails to decode is an
    /// [`ErrorKind::Decode`] error.
    #[instrument(skip(bytes), fields(input_size = bytes.len(), output_size = tracing::field::Empty))]
    pub fn resize(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let image = image::load_from_memory(bytes).or_raise(|| ErrorKind::Decode)?;
        let (width, height) = self.fit(image.width(), image.height());
        let resized = image.resize_exact(width, height, FilterType::Triangle);
        let jpeg = encode_jpeg(&resized)?;
        tracing::Span::current().record("output_size", jpeg.len());
        Ok(jpeg)
    }
}

/// Composite an image onto a white background, dropping the alpha channel.
pub fn flatten(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        let blend = |channel: u8| -> u8 { ((u16::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8 };
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

/// Flatten onto white and encode as JPEG.
pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(flatten(image))
        .write_to(&mut out, ImageFormat::Jpeg)
        .or_raise(|| ErrorKind::Encode)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use rstest::rstest;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image).write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[rstest]
    #[case((400, 600), (67, 100))]
    #[case((600, 400), (100, 67))]
    #[case((500, 500), (100, 100))]
    #[case((50, 20), (100, 40))]
    #[case((1000, 3), (100, 1))]
    #[case((2000, 1), (100, 1))]
    #[case((3, 1000), (1, 100))]
    fn test_fit(#[case] input: (u32, u32), #[case] expected: (u32, u32)) {
        assert_eq!(Thumbnailer::default().fit(input.0, input.1), expected);
    }

    #[test]
    fn test_fit_rounds_half_away_from_zero() {
        // 100 * 1 / 200 = 0.5 -> 1, 100 * 3 / 200 = 1.5 -> 2
        let thumbnailer = Thumbnailer::default();
        assert_eq!(thumbnailer.fit(200, 3), (100, 2));
        assert_eq!(Thumbnailer::new(10).fit(4, 1), (10, 3));
    }

    #[test]
    fn test_empty_in_empty_out() {
        assert!(Thumbnailer::default().resize(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_resize_to_jpeg() {
        let jpeg = Thumbnailer::default().resize(&png(400, 600)).unwrap();
        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (67, 100));
    }

    #[test]
    fn test_undecodable_bytes() {
        let err = Thumbnailer::default().resize(b"definitely not an image").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Decode));
    }

    #[rstest]
    #[case([10, 20, 30, 255], [10, 20, 30])]
    #[case([10, 20, 30, 0], [255, 255, 255])]
    #[case([0, 0, 0, 128], [127, 127, 127])]
    fn test_flatten(#[case] input: [u8; 4], #[case] expected: [u8; 3]) {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba(input)));
        assert_eq!(flatten(&image).get_pixel(0, 0).0, expected);
    }

    #[test]
    fn test_zero_size_is_bumped() {
        assert_eq!(Thumbnailer::new(0).size(), 1);
    }
}
