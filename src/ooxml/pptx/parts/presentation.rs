/// Presentation part - the main part in a .pptx package.
///
/// Corresponds to `/ppt/presentation.xml` in the package.
use crate::common::xml::Element;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::pptx::collections::{PartCollection, SlideCollection};

/// Id of the first `p:sldId`; lower values are reserved.
pub const FIRST_SLIDE_ID: u32 = 256;

/// Views the presentation keeps over its own relationships.
///
/// Both are filled when the part is loaded, in partname order, and the slide
/// collection grows as slides are added.
#[derive(Debug, Clone, Default)]
pub struct PresentationData {
    pub(crate) slide_masters: PartCollection,
    pub(crate) slides: SlideCollection,
}

impl PresentationData {
    #[inline]
    pub fn slide_masters(&self) -> &PartCollection {
        &self.slide_masters
    }

    #[inline]
    pub fn slides(&self) -> &SlideCollection {
        &self.slides
    }
}

/// Rebuild `p:sldIdLst` from the slide relationships, in their current order
/// and with their current ids.
///
/// The list is created if missing, in front of `p:sldSz` (or `p:notesSz`).
pub(crate) fn rewrite_sld_id_lst(presentation: &mut Element, rels: &Relationships) {
    if presentation.child("p:sldIdLst").is_none() {
        let at = presentation
            .position("p:sldSz")
            .or_else(|| presentation.position("p:notesSz"));
        let lst = Element::new("p:sldIdLst");
        match at {
            Some(index) => presentation.insert(index, lst),
            None => presentation.push(lst),
        }
    }

    let Some(lst) = presentation.child_mut("p:sldIdLst") else {
        return;
    };
    lst.clear_children();

    let mut buf = itoa::Buffer::new();
    for (n, rel) in rels.of_type(rt::SLIDE).enumerate() {
        let id = FIRST_SLIDE_ID + n as u32;
        lst.push(
            Element::new("p:sldId")
                .with_attr("id", buf.format(id))
                .with_attr("r:id", rel.r_id()),
        );
    }
}
