/// Error types for the presentation object model.
use crate::ooxml::opc::error::OpcError;
use crate::ooxml::opc::part::PartId;
use thiserror::Error;

/// Result type for presentation operations.
pub type Result<T> = std::result::Result<T, PptxError>;

#[derive(Error, Debug)]
pub enum PptxError {
    /// Packaging layer error, including duplicate relationship ids
    #[error("OPC error: {0}")]
    Opc(#[from] OpcError),

    /// A part's content type or partname was read before being assigned
    #[error("{field} of {part} read before it was assigned")]
    UnassignedField { field: &'static str, part: PartId },

    /// The primary document relationship targets a part that is not a presentation
    #[error("Unsupported document content type: {0}")]
    UnsupportedDocumentContentType(String),

    /// Image extension or format that cannot be embedded
    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    /// Image bytes that match no known format
    #[error("Unrecognized image format")]
    UnrecognizedImageFormat,

    /// XML part content that failed to parse
    #[error("Malformed part {partname}: {reason}")]
    MalformedPart { partname: String, reason: String },

    /// The package has no primary document relationship
    #[error("Package has no primary document part")]
    NoDocumentPart,

    /// No live package reaches the part
    #[error("{0} is not owned by any live package")]
    PartNotOwned(PartId),

    /// The handle does not belong to this package
    #[error("{0} does not belong to this package")]
    UnknownPart(PartId),

    /// The part is not of the kind the operation needs
    #[error("{part} is a {actual} part, expected {expected}")]
    UnexpectedPartKind {
        part: PartId,
        expected: &'static str,
        actual: &'static str,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
