/// Slide, slide layout and slide master payloads.
///
/// A slide points at the layout it inherits from, a layout at its master, and
/// a master lists its layouts. The layout/master pair is the cycle every
/// presentation contains.
use crate::common::xml::Element;
use crate::ooxml::opc::constants::namespace as ns;
use crate::ooxml::opc::part::PartId;
use crate::ooxml::pptx::collections::PartCollection;

/// A slide part.
///
/// Corresponds to `/ppt/slides/slideN.xml` in the package.
#[derive(Debug, Clone, Default)]
pub struct SlideData {
    pub(crate) layout: Option<PartId>,
}

impl SlideData {
    /// Layout this slide inherits its appearance from.
    #[inline]
    pub fn slide_layout(&self) -> Option<PartId> {
        self.layout
    }
}

/// A slide layout part.
///
/// Corresponds to `/ppt/slideLayouts/slideLayoutN.xml` in the package.
#[derive(Debug, Clone, Default)]
pub struct SlideLayoutData {
    pub(crate) master: Option<PartId>,
}

impl SlideLayoutData {
    #[inline]
    pub fn slide_master(&self) -> Option<PartId> {
        self.master
    }
}

/// A slide master part.
///
/// Corresponds to `/ppt/slideMasters/slideMasterN.xml` in the package.
#[derive(Debug, Clone, Default)]
pub struct SlideMasterData {
    pub(crate) layouts: PartCollection,
}

impl SlideMasterData {
    /// Layouts of this master, in partname order.
    #[inline]
    pub fn slide_layouts(&self) -> &PartCollection {
        &self.layouts
    }
}

/// Minimal schema-valid content of a new slide: an empty shape tree.
pub(crate) fn new_slide_element() -> Element {
    let nv_grp_sp_pr = Element::new("p:nvGrpSpPr")
        .with_child(Element::new("p:cNvPr").with_attr("id", "1").with_attr("name", ""))
        .with_child(Element::new("p:cNvGrpSpPr"))
        .with_child(Element::new("p:nvPr"));

    Element::new("p:sld")
        .with_attr("xmlns:a", ns::DML_MAIN)
        .with_attr("xmlns:r", ns::OFC_RELATIONSHIPS)
        .with_attr("xmlns:p", ns::PML_MAIN)
        .with_child(
            Element::new("p:cSld").with_child(
                Element::new("p:spTree")
                    .with_child(nv_grp_sp_pr)
                    .with_child(Element::new("p:grpSpPr")),
            ),
        )
}
