// Compression pipeline - decode, normalize to RGB, re-encode, measure, register.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use super::registry::{CompressionRecord, SessionRegistry};
use super::stats::CompressionStats;
use crate::codec::traits::ImageCodec;
use crate::config::COMPRESSED_SUFFIX;
use crate::error::CompressError;

/// Raw upload as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct CompressionReport {
    pub record: CompressionRecord,
    pub stats: CompressionStats,
}

pub struct Compressor {
    codec: Arc<dyn ImageCodec>,
    outputs_dir: PathBuf,
    registry: SessionRegistry,
}

impl Compressor {
    pub fn new(codec: Arc<dyn ImageCodec>, outputs_dir: PathBuf, registry: SessionRegistry) -> Self {
        Self {
            codec,
            outputs_dir,
            registry,
        }
    }

    pub fn codec(&self) -> &dyn ImageCodec {
        self.codec.as_ref()
    }

    /// Compress one upload and append it to the registry.
    ///
    /// Blocking: decoding and encoding run on the calling thread.
    pub fn compress(&self, upload: &Upload, quality: i64) -> Result<CompressionReport, CompressError> {
        if upload.data.is_empty() {
            return Err(CompressError::EmptyUpload);
        }
        let input_size = upload.data.len() as u64;

        let decoded = self.codec.decode(&upload.data)?;
        debug!(
            "decoded {} ({}x{}, {:?})",
            upload.filename,
            decoded.width(),
            decoded.height(),
            decoded.color()
        );
        let rgb = decoded.to_rgb8();

        fs::create_dir_all(&self.outputs_dir)?;
        let output_path = output_path_for(&self.outputs_dir, &upload.filename, self.codec.extension());
        let output_size = self.codec.encode_to_path(&rgb, quality, &output_path)?;

        let stats = CompressionStats::new(input_size, output_size)?;
        let record = CompressionRecord {
            output_path,
            original_filename: upload.filename.clone(),
        };
        self.registry.push(record.clone());

        info!(
            "compressed {} at quality {}: {} -> {} bytes ({})",
            upload.filename,
            quality,
            stats.input_size,
            stats.output_size,
            stats.formatted_percentage()
        );

        Ok(CompressionReport { record, stats })
    }
}

/// Final path segment of a client-supplied filename, so a name like
/// `../../etc/passwd` cannot leave the outputs directory.
fn safe_file_name(filename: &str) -> &str {
    let name = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    match name {
        "" | "." | ".." => "upload",
        other => other,
    }
}

/// `<outputs_dir>/<filename>_compressed.<ext>`
pub fn output_path_for(outputs_dir: &Path, filename: &str, extension: &str) -> PathBuf {
    outputs_dir.join(format!(
        "{}{}.{}",
        safe_file_name(filename),
        COMPRESSED_SUFFIX,
        extension
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::jpeg::JpegCodec;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn noisy_png() -> Bytes {
        let image = RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, ((x * y) % 256) as u8])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        Bytes::from(out.into_inner())
    }

    fn compressor(dir: &Path) -> (Compressor, SessionRegistry) {
        let registry = SessionRegistry::new();
        let compressor = Compressor::new(
            Arc::new(JpegCodec::new()),
            dir.join("outputs"),
            registry.clone(),
        );
        (compressor, registry)
    }

    #[test]
    fn test_output_path_naming() {
        let dir = Path::new("static/outputs");
        assert_eq!(
            output_path_for(dir, "cat.png", "jpg"),
            PathBuf::from("static/outputs/cat.png_compressed.jpg")
        );
        assert_eq!(
            output_path_for(dir, "../../secret.png", "jpg"),
            PathBuf::from("static/outputs/secret.png_compressed.jpg")
        );
        assert_eq!(
            output_path_for(dir, "C:\\pics\\dog.bmp", "jpg"),
            PathBuf::from("static/outputs/dog.bmp_compressed.jpg")
        );
        assert_eq!(
            output_path_for(dir, "..", "jpg"),
            PathBuf::from("static/outputs/upload_compressed.jpg")
        );
    }

    #[test]
    fn test_compress_registers_and_measures() {
        let dir = tempfile::tempdir().unwrap();
        let (compressor, registry) = compressor(dir.path());
        let upload = Upload {
            filename: "noise.png".to_string(),
            data: noisy_png(),
        };

        let report = compressor.compress(&upload, 20).unwrap();

        assert_eq!(report.stats.input_size, upload.data.len() as u64);
        assert_eq!(
            report.stats.output_size,
            fs::metadata(&report.record.output_path).unwrap().len()
        );
        assert!(report.record.output_path.starts_with(dir.path().join("outputs")));
        assert_eq!(registry.snapshot(), vec![report.record]);
    }

    #[test]
    fn test_empty_upload_is_not_registered() {
        let dir = tempfile::tempdir().unwrap();
        let (compressor, registry) = compressor(dir.path());
        let upload = Upload {
            filename: "empty.png".to_string(),
            data: Bytes::new(),
        };

        assert!(matches!(
            compressor.compress(&upload, 20),
            Err(CompressError::EmptyUpload)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_out_of_range_quality_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let (compressor, registry) = compressor(dir.path());
        let over = Upload {
            filename: "over.png".to_string(),
            data: noisy_png(),
        };
        let max = Upload {
            filename: "max.png".to_string(),
            data: noisy_png(),
        };

        let over = compressor.compress(&over, 250).unwrap();
        let max = compressor.compress(&max, 100).unwrap();

        assert_eq!(
            fs::read(&over.record.output_path).unwrap(),
            fs::read(&max.record.output_path).unwrap()
        );
        assert_eq!(registry.len(), 2);
    }
}
