/// Base shape types for PowerPoint presentations.
use crate::common::xml::Element;

/// Shape type enumeration.
///
/// Indicates what kind of shape this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    /// An auto shape or text box (p:sp)
    Shape,
    /// A picture shape (p:pic)
    Picture,
    /// A graphic frame containing a table or chart (p:graphicFrame)
    GraphicFrame,
    /// A group shape (p:grpSp)
    GroupShape,
    /// A connector shape (p:cxnSp)
    Connector,
}

impl ShapeType {
    /// Shape type for a `p:spTree` child, `None` for non-shape children.
    pub fn from_tag(name: &str) -> Option<Self> {
        match name {
            "p:sp" => Some(Self::Shape),
            "p:pic" => Some(Self::Picture),
            "p:graphicFrame" => Some(Self::GraphicFrame),
            "p:grpSp" => Some(Self::GroupShape),
            "p:cxnSp" => Some(Self::Connector),
            _ => None,
        }
    }
}

/// Read-only view of one shape in a shape tree.
///
/// # Examples
///
/// ```rust,ignore
/// for shape in slide.shapes() {
///     println!("{} #{:?}: {}", shape.name(), shape.id(), shape.is_placeholder());
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BaseShape<'a> {
    element: &'a Element,
    shape_type: ShapeType,
}

impl<'a> BaseShape<'a> {
    pub(crate) fn new(element: &'a Element, shape_type: ShapeType) -> Self {
        Self { element, shape_type }
    }

    #[inline]
    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    #[inline]
    pub fn element(&self) -> &'a Element {
        self.element
    }

    /// The non-visual properties container (`p:nvSpPr`, `p:nvPicPr`, ...).
    fn nv_pr(&self) -> Option<&'a Element> {
        self.element.elements().find(|e| e.local_name().starts_with("nv"))
    }

    fn c_nv_pr(&self) -> Option<&'a Element> {
        self.nv_pr()?.child("p:cNvPr")
    }

    /// Shape id from `p:cNvPr/@id`.
    pub fn id(&self) -> Option<u32> {
        self.c_nv_pr()?
            .attr("id")
            .and_then(|id| atoi_simd::parse::<u32>(id.as_bytes()).ok())
    }

    /// Shape name from `p:cNvPr/@name`, empty when absent.
    pub fn name(&self) -> &'a str {
        self.c_nv_pr().and_then(|e| e.attr("name")).unwrap_or("")
    }

    /// Placeholder properties, if this shape is a placeholder.
    pub fn placeholder(&self) -> Option<PlaceholderFormat<'a>> {
        self.nv_pr()?
            .child("p:nvPr")?
            .child("p:ph")
            .map(|ph| PlaceholderFormat { ph })
    }

    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.placeholder().is_some()
    }
}

/// Attributes of a `p:ph` element, with schema defaults applied.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderFormat<'a> {
    ph: &'a Element,
}

impl<'a> PlaceholderFormat<'a> {
    /// Placeholder type (`title`, `body`, `dt`, ...); `obj` when unspecified.
    pub fn ph_type(&self) -> &'a str {
        self.ph.attr("type").unwrap_or("obj")
    }

    /// Placeholder index; 0 when unspecified.
    pub fn idx(&self) -> u32 {
        self.ph
            .attr("idx")
            .and_then(|idx| atoi_simd::parse::<u32>(idx.as_bytes()).ok())
            .unwrap_or(0)
    }

    /// Orientation, `horz` when unspecified.
    pub fn orient(&self) -> &'a str {
        self.ph.attr("orient").unwrap_or("horz")
    }

    #[inline]
    pub fn element(&self) -> &'a Element {
        self.ph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIC: &str = r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="Picture 3"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr></p:pic>"#;
    const PH: &str = r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title" orient="vert"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#;

    #[test]
    fn test_shape_properties() {
        let pic = Element::parse(PIC.as_bytes()).unwrap();
        let shape = BaseShape::new(&pic, ShapeType::Picture);
        assert_eq!(shape.id(), Some(4));
        assert_eq!(shape.name(), "Picture 3");
        assert!(!shape.is_placeholder());
    }

    #[test]
    fn test_placeholder_defaults() {
        let sp = Element::parse(PH.as_bytes()).unwrap();
        let shape = BaseShape::new(&sp, ShapeType::Shape);
        let ph = shape.placeholder().unwrap();
        assert_eq!(ph.ph_type(), "title");
        assert_eq!(ph.idx(), 0);
        assert_eq!(ph.orient(), "vert");

        let bare = Element::new("p:ph");
        let ph = PlaceholderFormat { ph: &bare };
        assert_eq!(ph.ph_type(), "obj");
        assert_eq!(ph.orient(), "horz");
    }

    #[test]
    fn test_from_tag() {
        assert_eq!(ShapeType::from_tag("p:cxnSp"), Some(ShapeType::Connector));
        assert_eq!(ShapeType::from_tag("p:nvGrpSpPr"), None);
    }
}
