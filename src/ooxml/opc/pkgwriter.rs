//! Package writer for OPC packages.
//!
//! Serializes a [`SerializedPackage`] into a physical container: the
//! `[Content_Types].xml` item, the package relationships, and every part
//! followed by its own relationships.

use crate::common::xml::{XML_DECLARATION, escape_xml};
use crate::ooxml::opc::constants::{content_type as ct, is_default_content_type, namespace};
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::ContainerWriter;
use crate::ooxml::opc::pkgreader::{SerializedPackage, SerializedRelationship, SerializedTarget};
use std::collections::BTreeMap;

/// Writes a [`SerializedPackage`] into a [`ContainerWriter`].
pub struct PackageWriter;

impl PackageWriter {
    pub fn write<C: ContainerWriter + ?Sized>(container: &mut C, package: &SerializedPackage) -> Result<()> {
        let cti = ContentTypesItem::from_package(package);
        container.write_member(&CONTENT_TYPES_URI[1..], cti.to_xml().as_bytes())?;

        let package_uri = PackURI::new(PACKAGE_URI)?;
        let pkg_rels_uri = package_uri.rels_uri()?;
        let pkg_rels_xml = Self::rels_xml(package.pkg_srels(), package_uri.base_uri());
        container.write_member(pkg_rels_uri.membername(), pkg_rels_xml.as_bytes())?;

        for spart in package.parts() {
            container.write_member(spart.partname.membername(), &spart.blob)?;

            if !spart.srels.is_empty() {
                let rels_uri = spart.partname.rels_uri()?;
                let rels_xml = Self::rels_xml(&spart.srels, spart.partname.base_uri());
                container.write_member(rels_uri.membername(), rels_xml.as_bytes())?;
            }
        }

        Ok(())
    }

    /// Generate the XML of a .rels item, keeping the given order.
    ///
    /// Internal targets are written relative to `base_uri`.
    pub fn rels_xml(srels: &[SerializedRelationship], base_uri: &str) -> String {
        let mut xml = String::with_capacity(256 + srels.len() * 160);

        xml.push_str(XML_DECLARATION);
        xml.push('\n');
        xml.push_str(r#"<Relationships xmlns=""#);
        xml.push_str(namespace::OPC_RELATIONSHIPS);
        xml.push_str(r#"">"#);
        xml.push('\n');

        for srel in srels {
            let (target, mode) = match &srel.target {
                SerializedTarget::Part(partname) => (partname.relative_ref(base_uri), ""),
                SerializedTarget::External(url) => (url.clone(), r#" TargetMode="External""#),
            };
            xml.push_str(&format!(
                r#"  <Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                escape_xml(&srel.r_id),
                escape_xml(&srel.reltype),
                escape_xml(&target),
                mode
            ));
            xml.push('\n');
        }

        xml.push_str("</Relationships>");
        xml
    }
}

/// Helper for building [Content_Types].xml content.
///
/// Manages Default and Override elements for content type mapping; both maps
/// are ordered so the output is deterministic.
struct ContentTypesItem {
    /// Default content types by extension
    defaults: BTreeMap<String, String>,

    /// Override content types by partname
    overrides: BTreeMap<String, String>,
}

impl ContentTypesItem {
    fn new() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), ct::XML.to_string());

        Self {
            defaults,
            overrides: BTreeMap::new(),
        }
    }

    fn from_package(package: &SerializedPackage) -> Self {
        let mut cti = Self::new();
        for spart in package.parts() {
            cti.add_content_type(&spart.partname, &spart.content_type);
        }
        cti
    }

    /// Use a Default entry for a well-known extension/type pair, an Override
    /// for the specific partname otherwise.
    fn add_content_type(&mut self, partname: &PackURI, content_type: &str) {
        let ext = partname.ext().to_lowercase();
        if is_default_content_type(&ext, content_type) {
            self.defaults.insert(ext, content_type.to_string());
        } else {
            self.overrides
                .insert(partname.to_string(), content_type.to_string());
        }
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + 160 * (self.defaults.len() + self.overrides.len()));

        xml.push_str(XML_DECLARATION);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns=""#);
        xml.push_str(namespace::OPC_CONTENT_TYPES);
        xml.push_str(r#"">"#);
        xml.push('\n');

        for (ext, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"  <Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(content_type)
            ));
            xml.push('\n');
        }

        for (partname, content_type) in &self.overrides {
            xml.push_str(&format!(
                r#"  <Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(partname),
                escape_xml(content_type)
            ));
            xml.push('\n');
        }

        xml.push_str("</Types>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as rt;
    use crate::ooxml::opc::phys_pkg::MemoryContainer;
    use crate::ooxml::opc::pkgreader::{PackageReader, SerializedPart};

    fn uri(s: &str) -> PackURI {
        PackURI::new(s).unwrap()
    }

    fn sample_package() -> SerializedPackage {
        let mut package = SerializedPackage::new();
        package.add_pkg_rel(SerializedRelationship::new(
            "rId1",
            rt::OFFICE_DOCUMENT,
            SerializedTarget::Part(uri("/ppt/presentation.xml")),
        ));
        package.add_part(
            SerializedPart::new(uri("/ppt/presentation.xml"), ct::PML_PRESENTATION_MAIN, &b"<p:presentation/>"[..])
                .with_rel(SerializedRelationship::new(
                    "rId7",
                    rt::SLIDE,
                    SerializedTarget::Part(uri("/ppt/slides/slide1.xml")),
                )),
        );
        package.add_part(
            SerializedPart::new(uri("/ppt/slides/slide1.xml"), ct::PML_SLIDE, &b"<p:sld/>"[..])
                .with_rel(SerializedRelationship::new(
                    "rId2",
                    rt::IMAGE,
                    SerializedTarget::Part(uri("/ppt/media/image1.png")),
                ))
                .with_rel(SerializedRelationship::new(
                    "rId1",
                    rt::HYPERLINK,
                    SerializedTarget::External("https://example.com/a&b".to_string()),
                )),
        );
        package.add_part(SerializedPart::new(uri("/ppt/media/image1.png"), ct::PNG, &b"\x89PNG"[..]));
        package
    }

    #[test]
    fn test_content_types_xml() {
        let cti = ContentTypesItem::from_package(&sample_package());
        let xml = cti.to_xml();

        assert!(xml.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
        assert!(xml.contains(r#"<Default Extension="rels""#));
        assert!(xml.contains(r#"<Override PartName="/ppt/slides/slide1.xml""#));
        assert!(!xml.contains(r#"PartName="/ppt/media/image1.png""#));
    }

    #[test]
    fn test_rels_xml_keeps_order_and_relative_targets() {
        let package = sample_package();
        let slide = package.part(&uri("/ppt/slides/slide1.xml")).unwrap();
        let xml = PackageWriter::rels_xml(&slide.srels, "/ppt/slides");

        let image = xml.find(r#"Target="../media/image1.png""#).unwrap();
        let link = xml
            .find(r#"Target="https://example.com/a&amp;b" TargetMode="External""#)
            .unwrap();
        assert!(image < link);
    }

    #[test]
    fn test_write_then_read() {
        let package = sample_package();
        let mut container = MemoryContainer::new();
        PackageWriter::write(&mut container, &package).unwrap();

        assert!(container.get("[Content_Types].xml").is_some());
        assert!(container.get("_rels/.rels").is_some());
        assert!(container.get("ppt/slides/_rels/slide1.xml.rels").is_some());
        assert!(container.get("ppt/media/_rels/image1.png.rels").is_none());

        let reread = PackageReader::read(&mut container).unwrap();
        assert_eq!(reread.len(), 3);
        for spart in package.parts() {
            let other = reread.part(&spart.partname).unwrap();
            assert_eq!(other.content_type, spart.content_type);
            assert_eq!(other.blob, spart.blob);
            assert_eq!(other.srels, spart.srels);
        }
    }
}
