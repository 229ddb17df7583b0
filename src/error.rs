//! Error taxonomy for the compression service.
//!
//! Every request handler converts these into a response; none of them is
//! allowed to take the process down.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("No image file provided")]
    MissingImage,

    #[error("uploaded file is empty")]
    EmptyUpload,

    #[error("{0}")]
    Validation(String),

    #[error("cannot identify image file: unsupported format")]
    UnsupportedFormat,

    #[error("cannot decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("cannot encode image: {reason}")]
    Encode { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("index {index} out of range (have {len} compressed images)")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl CompressError {
    /// HTTP status code reported for this error, both in the status line and
    /// in the `[message, code]` body.
    pub fn status_code(&self) -> u16 {
        match self {
            CompressError::MissingImage | CompressError::EmptyUpload => 400,
            CompressError::IndexOutOfRange { .. } => 404,
            CompressError::Validation(_) => 422,
            CompressError::UnsupportedFormat
            | CompressError::Decode(_)
            | CompressError::Encode { .. }
            | CompressError::Io(_)
            | CompressError::Archive(_)
            | CompressError::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_4xx() {
        assert_eq!(CompressError::MissingImage.status_code(), 400);
        assert_eq!(CompressError::EmptyUpload.status_code(), 400);
        assert_eq!(CompressError::Validation("bad".into()).status_code(), 422);
        assert_eq!(
            CompressError::IndexOutOfRange { index: 3, len: 1 }.status_code(),
            404
        );
    }

    #[test]
    fn test_codec_and_io_errors_are_500() {
        assert_eq!(CompressError::UnsupportedFormat.status_code(), 500);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(CompressError::from(io).status_code(), 500);
    }

    #[test]
    fn test_missing_image_message_matches_wire_text() {
        assert_eq!(CompressError::MissingImage.to_string(), "No image file provided");
    }
}
