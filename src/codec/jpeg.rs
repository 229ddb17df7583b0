// JPEG codec backed by the `image` crate.

use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use tracing::debug;

use super::traits::ImageCodec;
use crate::detect::format::{detect_image_kind, ImageKind};
use crate::error::CompressError;

/// Highest quality the encoder understands; larger values are clamped to it.
pub const MAX_QUALITY: i64 = 100;

#[derive(Debug, Default, Clone, Copy)]
pub struct JpegCodec;

impl JpegCodec {
    pub fn new() -> Self {
        Self
    }

    /// Clamp a caller-supplied quality onto the encoder's 1..=100 scale.
    fn encoder_quality(quality: i64) -> u8 {
        quality.clamp(1, MAX_QUALITY) as u8
    }
}

fn image_format(kind: ImageKind) -> Option<ImageFormat> {
    match kind {
        ImageKind::Jpeg => Some(ImageFormat::Jpeg),
        ImageKind::Png => Some(ImageFormat::Png),
        ImageKind::Gif => Some(ImageFormat::Gif),
        ImageKind::WebP => Some(ImageFormat::WebP),
        ImageKind::Bmp => Some(ImageFormat::Bmp),
        ImageKind::Tiff => Some(ImageFormat::Tiff),
        ImageKind::Unknown => None,
    }
}

impl ImageCodec for JpegCodec {
    fn extension(&self) -> &'static str {
        "jpg"
    }

    fn content_type(&self) -> &'static str {
        "image/jpeg"
    }

    fn decode(&self, data: &[u8]) -> Result<DynamicImage, CompressError> {
        let kind = detect_image_kind(data);
        let format = image_format(kind).ok_or(CompressError::UnsupportedFormat)?;
        debug!("decoding {} bytes as {}", data.len(), kind.as_str());

        let mut reader = ImageReader::new(Cursor::new(data));
        reader.set_format(format);
        reader.decode().map_err(CompressError::Decode)
    }

    fn encode_to_path(
        &self,
        image: &RgbImage,
        quality: i64,
        path: &Path,
    ) -> Result<u64, CompressError> {
        let quality = Self::encoder_quality(quality);

        let mut writer = BufWriter::new(File::create(path)?);
        JpegEncoder::new_with_quality(&mut writer, quality)
            .encode_image(image)
            .map_err(|e| CompressError::Encode {
                reason: e.to_string(),
            })?;
        writer.flush()?;
        drop(writer);

        Ok(fs::metadata(path)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, Rgba, RgbaImage};

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png_with_alpha() {
        let rgba = RgbaImage::from_pixel(8, 6, Rgba([10, 20, 30, 128]));
        let data = png_bytes(DynamicImage::ImageRgba8(rgba));

        let decoded = JpegCodec::new().decode(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn test_decode_rejects_unknown_bytes() {
        let err = JpegCodec::new().decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, CompressError::UnsupportedFormat));
    }

    #[test]
    fn test_decode_truncated_png_is_decode_error() {
        let data = png_bytes(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            16,
            16,
            Luma([200]),
        )));
        let err = JpegCodec::new().decode(&data[..20]).unwrap_err();
        assert!(matches!(err, CompressError::Decode(_)));
    }

    #[test]
    fn test_encode_reports_size_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let image = RgbImage::from_pixel(32, 32, Rgb([250, 10, 10]));

        let written = JpegCodec::new().encode_to_path(&image, 20, &path).unwrap();
        assert!(written > 0);
        assert_eq!(written, fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_encode_clamps_out_of_range_quality() {
        let dir = tempfile::tempdir().unwrap();
        let image = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 15) as u8, (y * 15) as u8, 77]));
        let codec = JpegCodec::new();

        let encode = |quality: i64, name: &str| {
            let path = dir.path().join(name);
            codec.encode_to_path(&image, quality, &path).unwrap();
            fs::read(&path).unwrap()
        };

        assert_eq!(encode(250, "q250.jpg"), encode(100, "q100.jpg"));
        assert_eq!(encode(-5, "neg.jpg"), encode(1, "q1.jpg"));
        assert_eq!(encode(0, "zero.jpg"), encode(1, "q1b.jpg"));
    }
}
