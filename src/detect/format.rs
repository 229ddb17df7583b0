#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    WebP,
    Bmp,
    Tiff,
    Unknown,
}

impl ImageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpeg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::WebP => "webp",
            ImageKind::Bmp => "bmp",
            ImageKind::Tiff => "tiff",
            ImageKind::Unknown => "unknown",
        }
    }
}

/// Detect the image format from the first bytes of an upload.
pub fn detect_image_kind(header: &[u8]) -> ImageKind {
    // JPEG: SOI marker followed by the start of another marker
    if header.len() >= 3 && header[0..3] == [0xFF, 0xD8, 0xFF] {
        return ImageKind::Jpeg;
    }

    if header.len() >= 8 && header[0..8] == [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A] {
        return ImageKind::Png;
    }

    if header.len() >= 6 && (&header[0..6] == b"GIF87a" || &header[0..6] == b"GIF89a") {
        return ImageKind::Gif;
    }

    // WebP: RIFF container with "WEBP" form type at offset 8
    if header.len() >= 12 && &header[0..4] == b"RIFF" && &header[8..12] == b"WEBP" {
        return ImageKind::WebP;
    }

    if header.len() >= 2 && &header[0..2] == b"BM" {
        return ImageKind::Bmp;
    }

    // TIFF: byte-order mark then the magic 42 in that byte order
    if header.len() >= 4
        && (header[0..4] == [b'I', b'I', 0x2A, 0x00] || header[0..4] == [b'M', b'M', 0x00, 0x2A])
    {
        return ImageKind::Tiff;
    }

    ImageKind::Unknown
}
