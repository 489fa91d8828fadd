/// Open Packaging Conventions (OPC) implementation.
///
/// This module provides the packaging layer beneath the presentation model:
///
/// - Partnames ([`PackURI`]) and content-type tables
/// - Ordered relationship collections with free and canonical ordering
/// - The raw part/relationship graph ([`SerializedPackage`]) read from and
///   written to a physical container
/// - ZIP-based physical packaging (with the `zip` feature)
///
/// # Performance Features
///
/// - Uses `quick-xml` for streaming parsing of `.rels` and `[Content_Types].xml`
/// - Uses `atoi_simd` and `itoa` for rId and partname index conversion
/// - Part blobs are `bytes::Bytes`, shared between model and writer without copying
pub mod constants;
pub mod error;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

// Re-export commonly used types
pub use error::{OpcError, Result};
pub use packuri::PackURI;
pub use part::{PartId, Source};
pub use phys_pkg::{ContainerReader, ContainerWriter, MemoryContainer, ReaderLimits};
#[cfg(feature = "zip")]
pub use phys_pkg::{ZipContainerReader, ZipContainerWriter};
pub use pkgreader::{PackageReader, SerializedPackage, SerializedPart, SerializedRelationship, SerializedTarget};
pub use pkgwriter::PackageWriter;
pub use rel::{RelTarget, Relationship, Relationships};
