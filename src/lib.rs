//! Litchi PPTX - the object model of PowerPoint (.pptx) packages.
//!
//! A .pptx file is a ZIP container of parts (XML or binary) joined by typed
//! relationships. This crate loads that part graph, keeps it consistent while
//! it is edited, and saves it again.
//!
//! # Features
//!
//! - **Part graph**: parts live in an arena and refer to each other by id, so
//!   relationship cycles (layout <-> master) are plain data
//! - **Relationship ordering**: free order by id, or canonical order grouped by
//!   relationship type with contiguous ids
//! - **Slides and images**: add slides from a layout, add deduplicated images,
//!   with contiguous partname numbering
//! - **Round trips**: loading and saving without edits keeps partnames,
//!   relationship ids and their order
//!
//! # Example - Adding a slide
//!
//! ```no_run
//! use litchi_pptx::Package;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pkg = Package::new()?;
//! let master = pkg.slide_masters()?.get(0).expect("template has a master");
//! let layout = pkg.part(master)?.slide_layouts().and_then(|layouts| layouts.get(0));
//!
//! let slide = pkg.add_slide(layout)?;
//! let image = pkg.add_image_file("logo.png")?;
//! pkg.relate(slide, litchi_pptx::ooxml::opc::constants::relationship_type::IMAGE, image)?;
//! pkg.save("deck.pptx")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Finding the package of a part
//!
//! ```no_run
//! use litchi_pptx::Package;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pkg = Package::open("presentation.pptx")?;
//! let first = pkg.slides()?.get(0).expect("at least one slide");
//! assert_eq!(Package::containing(first)?, pkg.id());
//! # Ok(())
//! # }
//! ```

/// Shared XML utilities
pub mod common;

/// OOXML (Office Open XML) package layers
pub mod ooxml;

// Re-export commonly used types for convenience
pub use ooxml::opc::{OpcError, PackURI, PartId, Source};
pub use ooxml::pptx::{Package, PackageId, Part, PartKind, PptxError};
