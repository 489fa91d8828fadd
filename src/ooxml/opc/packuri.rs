/// Provides the PackURI value type and utilities for working with package URIs.
///
/// A PackURI is the partname of a part within an OPC package, e.g.
/// `/ppt/slides/slide1.xml`. It always begins with a forward slash and uses
/// forward slashes as path separators.
use crate::ooxml::opc::error::{OpcError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    /// The full pack URI string (e.g., "/ppt/presentation.xml")
    uri: String,
}

impl PackURI {
    /// Create a new PackURI from a string.
    ///
    /// Fails with [`OpcError::InvalidPackUri`] if the URI doesn't begin with a slash.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(OpcError::InvalidPackUri(format!(
                "PackURI must begin with slash, got '{}'",
                uri
            )));
        }
        Ok(PackURI { uri })
    }

    /// Resolve a relative reference (like `../slideLayouts/slideLayout1.xml`)
    /// against a base URI (like `/ppt/slides`).
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self> {
        // Absolute targets ignore the base
        let joined = if relative_ref.starts_with('/') {
            relative_ref.to_string()
        } else if base_uri.ends_with('/') {
            format!("{}{}", base_uri, relative_ref)
        } else {
            format!("{}/{}", base_uri, relative_ref)
        };
        Self::new(Self::normalize_path(&joined))
    }

    /// The directory portion, e.g. `/ppt/slides` for `/ppt/slides/slide1.xml`.
    ///
    /// `/` for the package pseudo-partname and for top-level parts.
    pub fn base_uri(&self) -> &str {
        match memchr::memrchr(b'/', self.uri.as_bytes()) {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// The filename portion, e.g. `slide1.xml`. Empty for `/`.
    pub fn filename(&self) -> &str {
        match memchr::memrchr(b'/', self.uri.as_bytes()) {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// The extension without its leading period, e.g. `xml`.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match memchr::memrchr(b'.', filename.as_bytes()) {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// The numeric index of a tuple partname, or `None` for a singleton.
    ///
    /// 21 for `/ppt/slides/slide21.xml`, `None` for `/ppt/presentation.xml`.
    /// The stem must be letters followed by digits.
    pub fn idx(&self) -> Option<u32> {
        let filename = self.filename();
        let stem = match memchr::memrchr(b'.', filename.as_bytes()) {
            Some(pos) => &filename[..pos],
            None => filename,
        };
        let bytes = stem.as_bytes();
        let digits_at = bytes
            .iter()
            .rposition(|b| !b.is_ascii_digit())
            .map_or(0, |pos| pos + 1);
        if digits_at == 0 || digits_at == bytes.len() {
            return None;
        }
        if !bytes[..digits_at].iter().all(u8::is_ascii_alphabetic) {
            return None;
        }
        atoi_simd::parse::<u32>(&bytes[digits_at..]).ok()
    }

    /// The URI with its leading slash stripped, as used for ZIP member names.
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Relative reference from `base_uri` to this partname.
    ///
    /// `../slideLayouts/slideLayout1.xml` for `/ppt/slideLayouts/slideLayout1.xml`
    /// seen from `/ppt/slides`.
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == "/" {
            return self.membername().to_string();
        }

        let from_parts: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to_parts: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();

        let common = from_parts
            .iter()
            .zip(to_parts.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut result = String::with_capacity(self.uri.len() + 3 * (from_parts.len() - common));
        for _ in common..from_parts.len() {
            result.push_str("../");
        }
        result.push_str(&to_parts[common..].join("/"));
        result
    }

    /// Partname of the `.rels` part holding this part's relationships.
    ///
    /// `/ppt/slides/_rels/slide1.xml.rels` for `/ppt/slides/slide1.xml`,
    /// `/_rels/.rels` for the package itself.
    pub fn rels_uri(&self) -> Result<PackURI> {
        let filename = self.filename();
        let base_uri = self.base_uri();
        let rels_uri = if base_uri == "/" {
            format!("/_rels/{}.rels", filename)
        } else {
            format!("{}/_rels/{}.rels", base_uri, filename)
        };
        Self::new(rels_uri)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Resolve `.` and `..` segments.
    fn normalize_path(path: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for part in path.split('/') {
            match part {
                "" | "." => {},
                ".." => {
                    parts.pop();
                },
                _ => parts.push(part),
            }
        }

        let mut normalized = String::with_capacity(path.len());
        for part in parts {
            normalized.push('/');
            normalized.push_str(part);
        }
        if normalized.is_empty() {
            normalized.push('/');
        }
        normalized
    }
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

/// The package pseudo-partname, representing the package itself
pub const PACKAGE_URI: &str = "/";

/// The URI for the [Content_Types].xml part
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";
