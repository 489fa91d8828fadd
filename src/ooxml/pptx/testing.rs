//! In-memory presentation packages for tests.

use crate::ooxml::opc::constants::{content_type as ct, content_type_for_ext, relationship_type as rt};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::pkgreader::{SerializedPackage, SerializedPart, SerializedRelationship, SerializedTarget};

pub(crate) const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01\x00\x00\x00\x01\x08\x06\x00\x00\x00";
pub(crate) const JPEG_BYTES: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF\x00\x01\x01\x00\x00\x01\x00\x01\x00\x00";

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const SP_TREE_OPEN: &str = r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#;

const PRESENTATION: &str = "/ppt/presentation.xml";
const MASTER: &str = "/ppt/slideMasters/slideMaster1.xml";
const LAYOUT_1: &str = "/ppt/slideLayouts/slideLayout1.xml";
const LAYOUT_2: &str = "/ppt/slideLayouts/slideLayout2.xml";
const THEME: &str = "/ppt/theme/theme1.xml";
const CORE: &str = "/docProps/core.xml";

/// Builder for a presentation package with one master, two layouts (related
/// both ways with the master), a theme, and optional slides, images and an
/// external hyperlink.
///
/// Slides relate to the first layout. Images and the hyperlink hang off the
/// first slide (or the presentation when there are no slides), after its
/// layout relationship.
#[derive(Debug, Clone)]
pub(crate) struct PackageFixture {
    slide_numbers: Vec<u32>,
    slide_rid_step: usize,
    images: Vec<(u32, &'static str, &'static [u8])>,
    hyperlink: bool,
}

impl PackageFixture {
    pub(crate) fn new() -> Self {
        Self {
            slide_numbers: Vec::new(),
            slide_rid_step: 1,
            images: Vec::new(),
            hyperlink: false,
        }
    }

    /// Slides `slide1.xml..slide<n>.xml`.
    pub(crate) fn slides(mut self, n: u32) -> Self {
        self.slide_numbers = (1..=n).collect();
        self
    }

    /// Slides with the given partname numbers, related in the given order.
    pub(crate) fn slide_numbers(mut self, numbers: &[u32]) -> Self {
        self.slide_numbers = numbers.to_vec();
        self
    }

    /// Gap between the rIds of consecutive presentation->slide relationships.
    pub(crate) fn slide_rid_step(mut self, step: usize) -> Self {
        self.slide_rid_step = step.max(1);
        self
    }

    /// Next image, numbered after the ones already added.
    pub(crate) fn image(mut self, ext: &'static str, blob: &'static [u8]) -> Self {
        let n = self.images.len() as u32 + 1;
        self.images.push((n, ext, blob));
        self
    }

    pub(crate) fn image_named(mut self, n: u32, ext: &'static str, blob: &'static [u8]) -> Self {
        self.images.push((n, ext, blob));
        self
    }

    pub(crate) fn hyperlink(mut self) -> Self {
        self.hyperlink = true;
        self
    }

    pub(crate) fn build(&self) -> SerializedPackage {
        let mut spkg = SerializedPackage::new();
        spkg.add_pkg_rel(rel(1, rt::OFFICE_DOCUMENT, PRESENTATION));
        spkg.add_pkg_rel(rel(2, rt::CORE_PROPERTIES, CORE));

        let slide_names: Vec<String> = self
            .slide_numbers
            .iter()
            .map(|n| format!("/ppt/slides/slide{n}.xml"))
            .collect();

        let mut prs_rels = vec![rel(1, rt::SLIDE_MASTER, MASTER), rel(2, rt::THEME, THEME)];
        let mut sld_ids = String::new();
        for (i, name) in slide_names.iter().enumerate() {
            let r_id = 3 + i * self.slide_rid_step;
            prs_rels.push(rel(r_id, rt::SLIDE, name));
            sld_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, r_id));
        }
        let prs_xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {NS}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{sld_ids}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
        );

        // Images and the hyperlink go to the first slide, else the presentation
        let mut extra = Vec::new();
        let mut next = if slide_names.is_empty() { prs_rels.len() + 1 } else { 2 };
        for (n, ext, _) in &self.images {
            extra.push(rel(next, rt::IMAGE, &format!("/ppt/media/image{n}.{ext}")));
            next += 1;
        }
        if self.hyperlink {
            extra.push(SerializedRelationship::new(
                format!("rId{next}"),
                rt::HYPERLINK,
                SerializedTarget::External("https://example.com/".to_string()),
            ));
        }

        if slide_names.is_empty() {
            prs_rels.append(&mut extra);
        }
        spkg.add_part(with_rels(part(PRESENTATION, ct::PML_PRESENTATION_MAIN, prs_xml), prs_rels));

        for (i, name) in slide_names.iter().enumerate() {
            let mut slide_rels = vec![rel(1, rt::SLIDE_LAYOUT, LAYOUT_1)];
            if i == 0 {
                slide_rels.append(&mut extra);
            }
            let xml = format!(r#"<p:sld {NS}><p:cSld>{SP_TREE_OPEN}</p:spTree></p:cSld></p:sld>"#);
            spkg.add_part(with_rels(part(name, ct::PML_SLIDE, xml), slide_rels));
        }

        let master_xml = format!(
            r#"<p:sldMaster {NS}><p:cSld>{SP_TREE_OPEN}{}</p:spTree></p:cSld><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/><p:sldLayoutId id="2147483650" r:id="rId2"/></p:sldLayoutIdLst></p:sldMaster>"#,
            placeholder(2, "Title Placeholder 1", r#"type="title""#),
        );
        spkg.add_part(with_rels(
            part(MASTER, ct::PML_SLIDE_MASTER, master_xml),
            vec![rel(1, rt::SLIDE_LAYOUT, LAYOUT_1), rel(2, rt::SLIDE_LAYOUT, LAYOUT_2), rel(3, rt::THEME, THEME)],
        ));

        let layout_1_xml = format!(
            r#"<p:sldLayout {NS} type="title"><p:cSld name="Title Slide">{SP_TREE_OPEN}{}{}{}</p:spTree></p:cSld></p:sldLayout>"#,
            placeholder(2, "Title 1", r#"type="title""#),
            placeholder(3, "Content Placeholder 2", r#"idx="1""#),
            placeholder(4, "Date Placeholder 3", r#"type="dt" sz="half" idx="10""#),
        );
        spkg.add_part(with_rels(
            part(LAYOUT_1, ct::PML_SLIDE_LAYOUT, layout_1_xml),
            vec![rel(1, rt::SLIDE_MASTER, MASTER)],
        ));

        let layout_2_xml = format!(
            r#"<p:sldLayout {NS} type="titleOnly"><p:cSld name="Title Only">{SP_TREE_OPEN}{}</p:spTree></p:cSld></p:sldLayout>"#,
            placeholder(2, "Title 1", r#"type="title""#),
        );
        spkg.add_part(with_rels(
            part(LAYOUT_2, ct::PML_SLIDE_LAYOUT, layout_2_xml),
            vec![rel(1, rt::SLIDE_MASTER, MASTER)],
        ));

        spkg.add_part(part(THEME, ct::OFC_THEME, r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"/>"#.to_string()));
        spkg.add_part(part(CORE, ct::OPC_CORE_PROPERTIES, "<cp:coreProperties/>".to_string()));

        for (n, ext, blob) in &self.images {
            let content_type = content_type_for_ext(ext).unwrap_or(ct::OCTET_STREAM);
            spkg.add_part(SerializedPart::new(uri(&format!("/ppt/media/image{n}.{ext}")), content_type, *blob));
        }

        spkg
    }
}

fn uri(partname: &str) -> PackURI {
    PackURI::new(partname).unwrap()
}

fn rel(n: usize, reltype: &str, partname: &str) -> SerializedRelationship {
    SerializedRelationship::new(format!("rId{n}"), reltype, SerializedTarget::Part(uri(partname)))
}

fn part(partname: &str, content_type: &str, xml: String) -> SerializedPart {
    SerializedPart::new(uri(partname), content_type, xml)
}

fn with_rels(mut spart: SerializedPart, rels: Vec<SerializedRelationship>) -> SerializedPart {
    spart.srels.extend(rels);
    spart
}

fn placeholder(id: u32, name: &str, ph_attrs: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph {ph_attrs}/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#
    )
}
