use std::path::PathBuf;

use serde::Deserialize;

/// Quality used when a request does not supply `output_quality`.
pub const DEFAULT_OUTPUT_QUALITY: i64 = 20;

/// Upper bound on an upload body (32 MB).
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Template rendered by the landing page.
pub const LANDING_TEMPLATE: &str = "img_compress.html";

/// Filename offered to the client for the bundled archive.
pub const ARCHIVE_DOWNLOAD_NAME: &str = "compressed_images.zip";

/// Suffix appended to the original filename for the stored output.
pub const COMPRESSED_SUFFIX: &str = "_compressed";

pub const COMPRESS_SUCCESS_MESSAGE: &str = "Image compressed successfully";
pub const NO_IMAGE_AVAILABLE_MESSAGE: &str = "No compressed image available to download";
pub const NO_IMAGES_AVAILABLE_MESSAGE: &str = "No compressed images available to download";

/// Top-level configuration for the compression service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Interface the listener binds to.
    pub host: String,
    /// Listener port; 0 picks a free port.
    pub port: u16,
    /// Directory mounted under `/static`.
    pub static_dir: PathBuf,
    /// Directory holding HTML templates.
    pub templates_dir: PathBuf,
    /// Directory compressed images are written into.
    pub outputs_dir: PathBuf,
    /// Location of the archive rebuilt by the download-all endpoint.
    pub archive_path: PathBuf,
    /// Quality applied when the request omits one.
    pub default_quality: i64,
    /// Maximum accepted request body in bytes.
    pub max_upload_bytes: usize,
}

impl ServiceConfig {
    /// `host:port` string handed to the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Config rooted at `dir`: static, templates, outputs and the archive all
    /// live underneath it. The listener binds to a random local port.
    pub fn rooted_at(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            static_dir: dir.join("static"),
            templates_dir: dir.join("templates"),
            outputs_dir: dir.join("static").join("outputs"),
            archive_path: dir.join(ARCHIVE_DOWNLOAD_NAME),
            ..Self::default()
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            static_dir: PathBuf::from("static"),
            templates_dir: PathBuf::from("templates"),
            outputs_dir: PathBuf::from("static/outputs"),
            archive_path: PathBuf::from(ARCHIVE_DOWNLOAD_NAME),
            default_quality: DEFAULT_OUTPUT_QUALITY,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_binds_localhost_8000() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
        assert_eq!(config.outputs_dir, PathBuf::from("static/outputs"));
        assert_eq!(config.default_quality, 20);
    }

    #[test]
    fn test_rooted_at_keeps_layout_under_dir() {
        let config = ServiceConfig::rooted_at("/tmp/svc");
        assert_eq!(config.port, 0);
        assert_eq!(config.outputs_dir, PathBuf::from("/tmp/svc/static/outputs"));
        assert_eq!(
            config.archive_path,
            PathBuf::from("/tmp/svc/compressed_images.zip")
        );
    }
}
