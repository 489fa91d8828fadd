//! XML helpers shared by the package layers.

pub mod element;
pub mod escape;

pub use element::{Element, Node, XML_DECLARATION, XmlError};
pub use escape::escape_xml;
