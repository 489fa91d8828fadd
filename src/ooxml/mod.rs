//! Office Open XML (OOXML) package support.
//!
//! The implementation follows the Open Packaging Conventions (OPC): a package
//! is a graph of parts joined by typed relationships.
//!
//! # Architecture
//!
//! 1. **OPC Layer** (`opc`): partnames, relationships, content types and the
//!    physical container (ZIP)
//! 2. **Presentation Layer** (`pptx`): the part graph of a presentation and
//!    its slide, layout, master and image views
pub mod opc;
pub mod pptx;

// Re-export commonly used types from OPC layer
pub use opc::PackURI;
pub use pptx::Package;
