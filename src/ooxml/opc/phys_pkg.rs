//! Provides a general interface to a physical OPC package.
//!
//! The package reader and writer only ever deal with named members (ZIP
//! entries); [`ContainerReader`] and [`ContainerWriter`] are that narrow
//! interface. [`MemoryContainer`] keeps members in memory, and with the `zip`
//! feature [`ZipContainerReader`]/[`ZipContainerWriter`] speak the ZIP format.

use crate::ooxml::opc::error::Result;
use bytes::Bytes;
use std::collections::BTreeMap;

/// Read access to the members of a physical package.
pub trait ContainerReader {
    /// Content of the member named `membername` (no leading slash), or `None`
    /// if the container has no such member.
    fn read_member(&mut self, membername: &str) -> Result<Option<Bytes>>;
}

/// Write access to the members of a physical package.
pub trait ContainerWriter {
    fn write_member(&mut self, membername: &str, blob: &[u8]) -> Result<()>;
}

/// Bounds on how much a container reader may inflate.
///
/// Protects against decompression bombs: a member whose content exceeds
/// `max_part_bytes`, or a package whose members together exceed
/// `max_total_bytes`, is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderLimits {
    pub max_part_bytes: u64,
    pub max_total_bytes: u64,
}

impl ReaderLimits {
    pub const DEFAULT_MAX_PART_BYTES: u64 = 256 * 1024 * 1024;
    pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 512 * 1024 * 1024;

    /// No bounds at all; use only for trusted input.
    pub fn unlimited() -> Self {
        Self {
            max_part_bytes: u64::MAX,
            max_total_bytes: u64::MAX,
        }
    }
}

impl Default for ReaderLimits {
    fn default() -> Self {
        Self {
            max_part_bytes: Self::DEFAULT_MAX_PART_BYTES,
            max_total_bytes: Self::DEFAULT_MAX_TOTAL_BYTES,
        }
    }
}

/// An in-memory set of named members.
#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    members: BTreeMap<String, Bytes>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, membername: impl Into<String>, blob: impl Into<Bytes>) {
        self.members.insert(membername.into(), blob.into());
    }

    pub fn get(&self, membername: &str) -> Option<&Bytes> {
        self.members.get(membername)
    }

    /// Member names in sorted order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl ContainerReader for MemoryContainer {
    fn read_member(&mut self, membername: &str) -> Result<Option<Bytes>> {
        Ok(self.members.get(membername).cloned())
    }
}

impl ContainerWriter for MemoryContainer {
    fn write_member(&mut self, membername: &str, blob: &[u8]) -> Result<()> {
        self.members
            .insert(membername.to_string(), Bytes::copy_from_slice(blob));
        Ok(())
    }
}

#[cfg(feature = "zip")]
pub use self::zip_container::{ZipContainerReader, ZipContainerWriter};

#[cfg(feature = "zip")]
mod zip_container {
    use super::{ContainerReader, ContainerWriter, ReaderLimits};
    use crate::ooxml::opc::error::{OpcError, Result};
    use bytes::Bytes;
    use std::io::{Read, Seek, Write};
    use zip::result::ZipError;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipArchive, ZipWriter};

    /// Reads members out of a ZIP archive, inflating on demand.
    pub struct ZipContainerReader<R> {
        archive: ZipArchive<R>,
        limits: ReaderLimits,
        /// Bytes inflated so far, checked against `limits.max_total_bytes`
        inflated: u64,
    }

    impl<R: Read + Seek> ZipContainerReader<R> {
        /// Open a ZIP archive with default [`ReaderLimits`].
        pub fn new(reader: R) -> Result<Self> {
            Self::with_limits(reader, ReaderLimits::default())
        }

        pub fn with_limits(reader: R, limits: ReaderLimits) -> Result<Self> {
            Ok(Self {
                archive: ZipArchive::new(reader)?,
                limits,
                inflated: 0,
            })
        }

        /// Number of entries in the archive, directories included.
        #[inline]
        pub fn len(&self) -> usize {
            self.archive.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.archive.is_empty()
        }

        pub fn member_names(&self) -> impl Iterator<Item = &str> {
            self.archive.file_names()
        }
    }

    impl<R: Read + Seek> ContainerReader for ZipContainerReader<R> {
        fn read_member(&mut self, membername: &str) -> Result<Option<Bytes>> {
            let mut file = match self.archive.by_name(membername) {
                Ok(file) => file,
                Err(ZipError::FileNotFound) => return Ok(None),
                Err(e) => return Err(e.into()),
            };

            let max_part = self.limits.max_part_bytes;
            let too_large = || OpcError::PartTooLarge {
                partname: format!("/{}", membername),
                limit: max_part,
            };
            let declared = file.size();
            if declared > max_part {
                return Err(too_large());
            }

            // The declared size is not trusted; cap the actual inflation too
            let mut blob = Vec::with_capacity(declared as usize);
            file.by_ref()
                .take(max_part.saturating_add(1))
                .read_to_end(&mut blob)?;
            if blob.len() as u64 > max_part {
                return Err(too_large());
            }

            self.inflated = self.inflated.saturating_add(blob.len() as u64);
            if self.inflated > self.limits.max_total_bytes {
                return Err(OpcError::PackageTooLarge {
                    limit: self.limits.max_total_bytes,
                });
            }

            Ok(Some(Bytes::from(blob)))
        }
    }

    /// Writes members into a ZIP archive with Deflate compression.
    pub struct ZipContainerWriter<W: Write + Seek> {
        archive: ZipWriter<W>,
    }

    impl<W: Write + Seek> ZipContainerWriter<W> {
        pub fn new(writer: W) -> Self {
            Self {
                archive: ZipWriter::new(writer),
            }
        }

        /// Write the central directory and hand back the underlying writer.
        pub fn finish(self) -> Result<W> {
            Ok(self.archive.finish()?)
        }
    }

    impl<W: Write + Seek> ContainerWriter for ZipContainerWriter<W> {
        fn write_member(&mut self, membername: &str, blob: &[u8]) -> Result<()> {
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            self.archive.start_file(membername, options)?;
            self.archive.write_all(blob)?;
            Ok(())
        }
    }
}
