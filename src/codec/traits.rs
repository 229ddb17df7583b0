use std::path::Path;

use image::{DynamicImage, RgbImage};

use crate::error::CompressError;

pub trait ImageCodec: Send + Sync {
    /// Extension used for files this codec writes, without the dot.
    fn extension(&self) -> &'static str;

    /// MIME type served for files this codec writes.
    fn content_type(&self) -> &'static str;

    fn decode(&self, data: &[u8]) -> Result<DynamicImage, CompressError>;

    /// Encode `image` at `quality` into `path`, returning the number of bytes on disk.
    fn encode_to_path(&self, image: &RgbImage, quality: i64, path: &Path)
        -> Result<u64, CompressError>;
}
