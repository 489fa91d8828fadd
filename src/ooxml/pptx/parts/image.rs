//! Image part payload.
//!
//! Corresponds to package files `/ppt/media/image[1-9][0-9]*.*`. An image's
//! bytes are never rewritten; its identity within a package is the SHA-1 of
//! those bytes.

use sha1::{Digest, Sha1};

/// SHA-1 digest of image bytes.
pub type ImageDigest = [u8; 20];

/// State carried by an image part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// File extension without the leading dot, e.g. `png`
    ext: String,
    sha1: ImageDigest,
}

impl ImageData {
    pub fn new(ext: impl Into<String>, blob: &[u8]) -> Self {
        Self {
            ext: ext.into(),
            sha1: digest(blob),
        }
    }

    #[inline]
    pub fn ext(&self) -> &str {
        &self.ext
    }

    #[inline]
    pub fn sha1(&self) -> &ImageDigest {
        &self.sha1
    }

    /// Lowercase hex form of the digest.
    pub fn sha1_hex(&self) -> String {
        to_hex(&self.sha1)
    }
}

/// SHA-1 of `blob`.
pub fn digest(blob: &[u8]) -> ImageDigest {
    let mut sha = Sha1::new();
    sha.update(blob);
    let out = sha.finalize();

    let mut digest = [0u8; 20];
    digest.copy_from_slice(&out);
    digest
}

fn to_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}
