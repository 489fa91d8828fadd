//! PowerPoint (.pptx) presentation package model.
//!
//! A presentation is a graph of parts joined by typed relationships. This
//! module loads that graph from a physical container into an arena of
//! [`Part`]s, exposes the presentation-specific views over it (slides, slide
//! masters and layouts, images), supports adding slides and images, and
//! writes the graph back out.
//!
//! - [`Package`]: the loaded package and its live-instance registry
//! - [`PartGraph`]: the part arena, relationship edits and traversal
//! - [`PartFactory`] / [`PartKind`]: which part variant a relationship creates
//! - [`SlideCollection`], [`ImageCollection`], [`PartCollection`]: ordered views
//!
//! # Example
//!
//! ```rust,no_run
//! use litchi_pptx::ooxml::pptx::Package;
//!
//! let pkg = Package::open("presentation.pptx")?;
//! for slide in pkg.slides()? {
//!     let part = pkg.part(slide)?;
//!     println!("{}: {} shapes", part.partname()?, part.shapes().map_or(0, |s| s.len()));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod collections;
pub mod error;
pub mod format;
pub mod graph;
pub mod package;
pub mod parts;
pub mod registry;
pub mod shapes;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use collections::{ImageCollection, ImageSource, PartCollection, SlideCollection};
pub use error::{PptxError, Result};
pub use format::ImageFormat;
pub use graph::PartGraph;
pub use package::Package;
pub use parts::{Part, PartFactory, PartKind};
pub use registry::PackageId;
pub use shapes::{BaseShape, ShapeCollection, ShapeType};
