//! Image format detection for embedded pictures.

use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::pptx::error::{PptxError, Result};

/// Image formats recognized by their magic numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    /// Windows Metafile with an Aldus placeable header
    Wmf,
    /// Enhanced Metafile
    Emf,
}

impl ImageFormat {
    /// Get the MIME type for this image format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => ct::PNG,
            Self::Jpeg => ct::JPEG,
            Self::Gif => ct::GIF,
            Self::Bmp => ct::BMP,
            Self::Tiff => ct::TIFF,
            Self::Wmf => ct::X_WMF,
            Self::Emf => ct::X_EMF,
        }
    }

    /// Canonical file extension used for the image partname.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Wmf => "wmf",
            Self::Emf => "emf",
        }
    }

    /// Whether pictures of this format can be embedded from raw bytes.
    pub fn is_embeddable(&self) -> bool {
        !matches!(self, Self::Bmp | Self::Emf)
    }

    /// Detect image format from bytes (magic number detection).
    pub fn detect_from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // GIF: 47 49 46 38 (GIF8)
        if bytes.starts_with(&[0x47, 0x49, 0x46, 0x38]) {
            return Some(Self::Gif);
        }

        // BMP: 42 4D (BM)
        if bytes.starts_with(&[0x42, 0x4D]) {
            return Some(Self::Bmp);
        }

        // TIFF: 49 49 2A 00 (little-endian) or 4D 4D 00 2A (big-endian)
        if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some(Self::Tiff);
        }

        // WMF placeable header: D7 CD C6 9A
        if bytes.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A]) {
            return Some(Self::Wmf);
        }

        // EMF: EMR_HEADER record type 1, " EMF" signature at offset 40
        if bytes.starts_with(&[0x01, 0x00, 0x00, 0x00])
            && bytes.get(40..44) == Some(&b" EMF"[..])
        {
            return Some(Self::Emf);
        }

        None
    }
}

/// Extension for a picture given as raw bytes.
///
/// # Errors
///
/// [`PptxError::UnrecognizedImageFormat`] if the bytes match no known format,
/// [`PptxError::UnsupportedImageFormat`] if they are a format that cannot be
/// embedded (BMP, EMF).
pub fn sniff_image_ext(bytes: &[u8]) -> Result<&'static str> {
    let format = ImageFormat::detect_from_bytes(bytes).ok_or(PptxError::UnrecognizedImageFormat)?;
    if !format.is_embeddable() {
        return Err(PptxError::UnsupportedImageFormat(format.extension().to_string()));
    }
    Ok(format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_bytes() {
        assert_eq!(ImageFormat::detect_from_bytes(b"\x89PNG\r\n\x1a\n"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::detect_from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::detect_from_bytes(b"GIF89a"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::detect_from_bytes(b"MM\x00\x2a"), Some(ImageFormat::Tiff));
        assert_eq!(ImageFormat::detect_from_bytes(&[0xD7, 0xCD, 0xC6, 0x9A, 0]), Some(ImageFormat::Wmf));
        assert_eq!(ImageFormat::detect_from_bytes(b"BM\x00\x00"), Some(ImageFormat::Bmp));
        assert_eq!(ImageFormat::detect_from_bytes(b"GIF"), None);
        assert_eq!(ImageFormat::detect_from_bytes(b"hello world"), None);

        let mut emf = vec![0u8; 48];
        emf[0] = 1;
        emf[40..44].copy_from_slice(b" EMF");
        assert_eq!(ImageFormat::detect_from_bytes(&emf), Some(ImageFormat::Emf));
    }

    #[test]
    fn test_sniff_image_ext() {
        assert_eq!(sniff_image_ext(b"\x89PNG\r\n\x1a\n").unwrap(), "png");
        assert_eq!(sniff_image_ext(&[0xFF, 0xD8, 0xFF, 0xDB]).unwrap(), "jpg");
        assert_eq!(sniff_image_ext(b"II\x2a\x00").unwrap(), "tiff");
        assert!(matches!(
            sniff_image_ext(b"BM\x00\x00"),
            Err(PptxError::UnsupportedImageFormat(ref ext)) if ext == "bmp"
        ));
        assert!(matches!(sniff_image_ext(b"plain text"), Err(PptxError::UnrecognizedImageFormat)));
    }
}
