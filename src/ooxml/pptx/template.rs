//! Presentation template module.
//!
//! Provides the default package a new presentation starts from: one slide
//! master, the "Title Slide" and "Title and Content" layouts, a theme and the
//! document properties, with no slides.

use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::pkgreader::{SerializedPackage, SerializedPart, SerializedRelationship, SerializedTarget};

pub const PRESENTATION_XML: &str = include_str!("templates/presentation.xml");
pub const SLIDE_MASTER_XML: &str = include_str!("templates/slideMaster1.xml");
pub const SLIDE_LAYOUT_TITLE_XML: &str = include_str!("templates/slideLayout1.xml");
pub const SLIDE_LAYOUT_TITLE_AND_CONTENT_XML: &str = include_str!("templates/slideLayout2.xml");
pub const THEME_XML: &str = include_str!("templates/theme1.xml");
pub const CORE_PROPS_XML: &str = include_str!("templates/core.xml");
pub const APP_PROPS_XML: &str = include_str!("templates/app.xml");

const PRESENTATION: &str = "/ppt/presentation.xml";
const SLIDE_MASTER: &str = "/ppt/slideMasters/slideMaster1.xml";
const SLIDE_LAYOUT_1: &str = "/ppt/slideLayouts/slideLayout1.xml";
const SLIDE_LAYOUT_2: &str = "/ppt/slideLayouts/slideLayout2.xml";
const THEME: &str = "/ppt/theme/theme1.xml";
const CORE_PROPS: &str = "/docProps/core.xml";
const APP_PROPS: &str = "/docProps/app.xml";

fn rel(r_id: &str, reltype: &str, partname: &str) -> Result<SerializedRelationship> {
    Ok(SerializedRelationship::new(
        r_id,
        reltype,
        SerializedTarget::Part(PackURI::new(partname)?),
    ))
}

fn part(partname: &str, content_type: &str, xml: &'static str) -> Result<SerializedPart> {
    Ok(SerializedPart::new(PackURI::new(partname)?, content_type, xml))
}

/// The default presentation as a raw part graph.
pub fn default_package() -> Result<SerializedPackage> {
    let mut spkg = SerializedPackage::new();

    spkg.add_pkg_rel(rel("rId1", rt::OFFICE_DOCUMENT, PRESENTATION)?);
    spkg.add_pkg_rel(rel("rId2", rt::CORE_PROPERTIES, CORE_PROPS)?);
    spkg.add_pkg_rel(rel("rId3", rt::EXTENDED_PROPERTIES, APP_PROPS)?);

    spkg.add_part(
        part(PRESENTATION, ct::PML_PRESENTATION_MAIN, PRESENTATION_XML)?
            .with_rel(rel("rId1", rt::SLIDE_MASTER, SLIDE_MASTER)?)
            .with_rel(rel("rId2", rt::THEME, THEME)?),
    );
    spkg.add_part(
        part(SLIDE_MASTER, ct::PML_SLIDE_MASTER, SLIDE_MASTER_XML)?
            .with_rel(rel("rId1", rt::SLIDE_LAYOUT, SLIDE_LAYOUT_1)?)
            .with_rel(rel("rId2", rt::SLIDE_LAYOUT, SLIDE_LAYOUT_2)?)
            .with_rel(rel("rId3", rt::THEME, THEME)?),
    );
    spkg.add_part(
        part(SLIDE_LAYOUT_1, ct::PML_SLIDE_LAYOUT, SLIDE_LAYOUT_TITLE_XML)?
            .with_rel(rel("rId1", rt::SLIDE_MASTER, SLIDE_MASTER)?),
    );
    spkg.add_part(
        part(SLIDE_LAYOUT_2, ct::PML_SLIDE_LAYOUT, SLIDE_LAYOUT_TITLE_AND_CONTENT_XML)?
            .with_rel(rel("rId1", rt::SLIDE_MASTER, SLIDE_MASTER)?),
    );
    spkg.add_part(part(THEME, ct::OFC_THEME, THEME_XML)?);
    spkg.add_part(part(CORE_PROPS, ct::OPC_CORE_PROPERTIES, CORE_PROPS_XML)?);
    spkg.add_part(part(APP_PROPS, ct::OFC_EXTENDED_PROPERTIES, APP_PROPS_XML)?);

    Ok(spkg)
}
