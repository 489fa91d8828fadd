//! A small mutable XML element tree.
//!
//! Part content is parsed once into an [`Element`] tree so that it can be edited
//! in place (slide id lists, shape trees) and serialized back to bytes. Text
//! nodes keep their original escaped form, so content the model never touches
//! is written back exactly as it was read.

use super::escape::escape_xml;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// XML declaration written in front of every serialized part.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Errors raised while building an element tree.
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("XML parsing error: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("Invalid attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("No root element found")]
    NoRoot,

    #[error("Unclosed element <{0}>")]
    Unclosed(String),

    #[error("Unexpected closing tag </{0}>")]
    UnexpectedEnd(String),
}

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data in its escaped, on-the-wire form.
    Text(String),
    CData(String),
    Comment(String),
    /// Processing instruction body (target and data).
    ProcessingInstruction(String),
}

/// An XML element with qualified name, attributes in document order and children.
///
/// Names are kept as written (`p:sldId`, `r:id`); namespace declarations are
/// ordinary attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`Element::set_attr`].
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder form of [`Element::push`].
    pub fn with_child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    /// Parse a complete document and return its root element.
    ///
    /// The XML declaration, doctype and anything outside the root element are
    /// dropped.
    pub fn parse(bytes: &[u8]) -> Result<Self, XmlError> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => stack.push(Self::from_start(e)?),
                Event::Empty(ref e) => {
                    let element = Self::from_start(e)?;
                    Self::attach(&mut stack, &mut root, element);
                },
                Event::End(ref e) => {
                    let element = stack.pop().ok_or_else(|| {
                        XmlError::UnexpectedEnd(String::from_utf8_lossy(e.name().as_ref()).into_owned())
                    })?;
                    Self::attach(&mut stack, &mut root, element);
                },
                Event::Text(ref t) => {
                    if let Some(current) = stack.last_mut() {
                        current.push_text(std::str::from_utf8(t)?);
                    }
                },
                Event::GeneralRef(ref r) => {
                    if let Some(current) = stack.last_mut() {
                        let name = std::str::from_utf8(r)?;
                        current.push_text(&format!("&{};", name));
                    }
                },
                Event::CData(ref c) => {
                    if let Some(current) = stack.last_mut() {
                        let data = std::str::from_utf8(c)?.to_string();
                        current.children.push(Node::CData(data));
                    }
                },
                Event::Comment(ref c) => {
                    if let Some(current) = stack.last_mut() {
                        let comment = std::str::from_utf8(c)?.to_string();
                        current.children.push(Node::Comment(comment));
                    }
                },
                Event::PI(ref p) => {
                    if let Some(current) = stack.last_mut() {
                        let body = std::str::from_utf8(p)?.to_string();
                        current.children.push(Node::ProcessingInstruction(body));
                    }
                },
                Event::Decl(_) | Event::DocType(_) => {},
                Event::Eof => break,
            }
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::Unclosed(open.name));
        }
        root.ok_or(XmlError::NoRoot)
    }

    fn from_start(e: &BytesStart<'_>) -> Result<Self, XmlError> {
        let name = std::str::from_utf8(e.name().as_ref())?.to_string();
        let mut element = Element::new(name);
        for attr in e.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let value = attr.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None => {
                // Content after the first root is not well-formed; keep the first
                if root.is_none() {
                    *root = Some(element);
                }
            },
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local part of the qualified name (`sldId` for `p:sldId`).
    pub fn local_name(&self) -> &str {
        match self.name.rfind(':') {
            Some(pos) => &self.name[pos + 1..],
            None => &self.name,
        }
    }

    /// Attribute value by qualified name, unescaped.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place or appending.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[inline]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements, skipping text and other nodes.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given qualified name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.name == name)
    }

    /// Follow a path of qualified child names, e.g. `["p:cSld", "p:spTree"]`.
    pub fn descend(&self, path: &[&str]) -> Option<&Element> {
        path.iter().try_fold(self, |e, name| e.child(name))
    }

    pub fn descend_mut(&mut self, path: &[&str]) -> Option<&mut Element> {
        let mut current = self;
        for name in path {
            current = current.child_mut(name)?;
        }
        Some(current)
    }

    /// Index within `children()` of the first child element with this name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, Node::Element(e) if e.name == name))
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Insert a child element at `index` in `children()`, clamped to the end.
    pub fn insert(&mut self, index: usize, child: Element) {
        let index = index.min(self.children.len());
        self.children.insert(index, Node::Element(child));
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Serialize as a standalone document with the XML declaration.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(XML_DECLARATION.len() + 1 + self.estimated_len());
        out.push_str(XML_DECLARATION);
        out.push('\n');
        self.write_to(&mut out);
        out
    }

    /// Serialize the element alone, without a declaration.
    pub fn to_fragment(&self) -> String {
        let mut out = String::with_capacity(self.estimated_len());
        self.write_to(&mut out);
        out
    }

    fn estimated_len(&self) -> usize {
        let attrs: usize = self
            .attributes
            .iter()
            .map(|(k, v)| k.len() + v.len() + 4)
            .sum();
        let children: usize = self
            .children
            .iter()
            .map(|node| match node {
                Node::Element(e) => e.estimated_len(),
                Node::Text(t) | Node::CData(t) | Node::Comment(t) | Node::ProcessingInstruction(t) => {
                    t.len() + 12
                },
            })
            .sum();
        2 * self.name.len() + 5 + attrs + children
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_xml(value));
            out.push('"');
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for node in &self.children {
            match node {
                Node::Element(e) => e.write_to(out),
                Node::Text(t) => out.push_str(t),
                Node::CData(c) => {
                    out.push_str("<![CDATA[");
                    out.push_str(c);
                    out.push_str("]]>");
                },
                Node::Comment(c) => {
                    out.push_str("<!--");
                    out.push_str(c);
                    out.push_str("-->");
                },
                Node::ProcessingInstruction(p) => {
                    out.push_str("<?");
                    out.push_str(p);
                    out.push_str("?>");
                },
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld name="Intro &amp; Agenda"><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>Fish &amp; chips &lt;3</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#;

    #[test]
    fn test_parse_and_navigate() {
        let root = Element::parse(SLD.as_bytes()).unwrap();
        assert_eq!(root.name(), "p:sld");
        assert_eq!(root.local_name(), "sld");

        let c_sld = root.child("p:cSld").unwrap();
        assert_eq!(c_sld.attr("name"), Some("Intro & Agenda"));

        let t = root
            .descend(&["p:cSld", "p:spTree", "p:sp", "p:txBody", "a:p", "a:r", "a:t"])
            .unwrap();
        assert_eq!(t.children(), &[Node::Text("Fish &amp; chips &lt;3".to_string())]);
    }

    #[test]
    fn test_serialization_preserves_content() {
        let root = Element::parse(SLD.as_bytes()).unwrap();
        assert_eq!(root.to_xml(), SLD);
    }

    #[test]
    fn test_edit_and_serialize() {
        let mut root = Element::new("p:sldIdLst");
        root.push(Element::new("p:sldId").with_attr("id", "256").with_attr("r:id", "rId2"));
        root.insert(0, Element::new("p:sldId").with_attr("id", "257"));
        root.set_attr("x", "a\"b");
        assert_eq!(root.position("p:sldId"), Some(0));
        assert_eq!(
            root.to_fragment(),
            r#"<p:sldIdLst x="a&quot;b"><p:sldId id="257"/><p:sldId id="256" r:id="rId2"/></p:sldIdLst>"#
        );

        root.clear_children();
        assert_eq!(root.to_fragment(), r#"<p:sldIdLst x="a&quot;b"/>"#);
    }

    #[test]
    fn test_comments_and_cdata_survive() {
        let xml = "<a><!-- note --><b><![CDATA[1 < 2]]></b></a>";
        let root = Element::parse(xml.as_bytes()).unwrap();
        assert_eq!(root.to_fragment(), xml);
    }

    #[test]
    fn test_malformed_documents() {
        assert!(Element::parse(b"").is_err());
        assert!(Element::parse(b"<a><b></a>").is_err());
        assert!(Element::parse(b"<a>").is_err());
        assert!(Element::parse(b"not xml at all").is_err());
    }
}
