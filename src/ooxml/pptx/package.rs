/// Package implementation for PowerPoint presentations.
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::part::{PartId, Source};
use crate::ooxml::opc::phys_pkg::{ContainerReader, ContainerWriter};
use crate::ooxml::opc::pkgreader::{PackageReader, SerializedPackage};
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::rel::{Relationship, Relationships};
use crate::ooxml::pptx::collections::{ImageCollection, ImageSource, PartCollection, SlideCollection};
use crate::ooxml::pptx::error::{PptxError, Result};
use crate::ooxml::pptx::graph::PartGraph;
use crate::ooxml::pptx::parts::{Part, PartKind, PresentationData};
use crate::ooxml::pptx::registry::{self, PackageId, Reach};
use crate::ooxml::pptx::template;
use fixedbitset::FixedBitSet;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[cfg(feature = "zip")]
use crate::ooxml::opc::phys_pkg::{ReaderLimits, ZipContainerReader, ZipContainerWriter};
#[cfg(feature = "zip")]
use std::io::{BufReader, BufWriter, Read, Seek, Write};

/// A PowerPoint (.pptx) package.
///
/// This is the main entry point for working with PowerPoint presentations.
/// It owns the part graph, knows its presentation part, and keeps the image
/// collection used to deduplicate embedded pictures.
///
/// Every package is tracked in a process-wide registry for as long as it
/// lives, so [`Package::containing`] can map a part handle back to the package
/// that reaches it.
///
/// # Examples
///
/// ```rust,no_run
/// use litchi_pptx::ooxml::pptx::Package;
///
/// let mut pkg = Package::open("presentation.pptx")?;
/// println!("Presentation has {} slides", pkg.slides()?.len());
///
/// let master = pkg.slide_masters()?.get(0).expect("a slide master");
/// let layout = pkg.part(master)?.slide_layouts().and_then(|l| l.get(0));
/// pkg.add_slide(layout)?;
/// pkg.save("out.pptx")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Package {
    id: PackageId,
    graph: PartGraph,
    presentation: PartId,
    images: ImageCollection,
    reach: Reach,
}

impl Package {
    /// A new presentation built from the default template: one slide master,
    /// the "Title Slide" and "Title and Content" layouts and no slides.
    pub fn new() -> Result<Self> {
        Self::from_serialized(&template::default_package()?)
    }

    /// Open a .pptx package from a file path.
    #[cfg(feature = "zip")]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_limits(path, ReaderLimits::default())
    }

    /// Open a .pptx package, bounding how much its members may inflate.
    #[cfg(feature = "zip")]
    pub fn open_with_limits<P: AsRef<Path>>(path: P, limits: ReaderLimits) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let mut container = ZipContainerReader::with_limits(BufReader::new(file), limits)?;
        Self::from_container(&mut container)
    }

    /// Create a .pptx package from a reader.
    ///
    /// ```rust,no_run
    /// use litchi_pptx::ooxml::pptx::Package;
    /// use std::io::Cursor;
    ///
    /// let data = std::fs::read("presentation.pptx")?;
    /// let pkg = Package::from_reader(Cursor::new(data))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[cfg(feature = "zip")]
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut container = ZipContainerReader::new(reader)?;
        Self::from_container(&mut container)
    }

    /// Read a package out of any physical container.
    pub fn from_container<C: ContainerReader + ?Sized>(container: &mut C) -> Result<Self> {
        Self::from_serialized(&PackageReader::read(container)?)
    }

    /// Load a package from a raw part graph.
    ///
    /// # Errors
    ///
    /// [`PptxError::NoDocumentPart`] if no package relationship names the
    /// primary document, plus anything the load walk reports.
    pub fn from_serialized(spkg: &SerializedPackage) -> Result<Self> {
        let graph = PartGraph::load(spkg)?;
        let presentation = graph
            .pkg_rels()
            .part_with_reltype(rt::OFFICE_DOCUMENT)
            .map_err(|_| PptxError::NoDocumentPart)?;

        let walked = graph.walk();
        let images = ImageCollection::load(
            &graph,
            walked
                .iter()
                .copied()
                .filter(|&id| graph.part(id).is_ok_and(|p| matches!(p.kind(), PartKind::Image(_)))),
        );

        let package = Self::assemble(graph, presentation, images);
        info!(
            package = %package.id,
            parts = walked.len(),
            images = package.images.len(),
            "opened package"
        );
        Ok(package)
    }

    fn assemble(graph: PartGraph, presentation: PartId, images: ImageCollection) -> Self {
        let id = PackageId::new(graph.stamp());
        let reach: Reach = Arc::new(RwLock::new(graph.reach()));
        registry::register(id, &reach);
        Self {
            id,
            graph,
            presentation,
            images,
            reach,
        }
    }

    /// The live package whose reachable parts include `part`.
    ///
    /// # Errors
    ///
    /// [`PptxError::PartNotOwned`] if no live package reaches the part.
    pub fn containing(part: PartId) -> Result<PackageId> {
        registry::find(part).ok_or(PptxError::PartNotOwned(part))
    }

    /// Every package currently alive in this process.
    pub fn instances() -> Vec<PackageId> {
        registry::live()
    }

    #[inline]
    pub fn id(&self) -> PackageId {
        self.id
    }

    /// The presentation (primary document) part.
    #[inline]
    pub fn presentation(&self) -> PartId {
        self.presentation
    }

    fn presentation_data(&self) -> Result<&PresentationData> {
        let part = self.graph.part(self.presentation)?;
        match part.kind() {
            PartKind::Presentation(data) => Ok(data),
            other => Err(PptxError::UnexpectedPartKind {
                part: self.presentation,
                expected: "presentation",
                actual: other.name(),
            }),
        }
    }

    /// Slides in presentation order.
    pub fn slides(&self) -> Result<&SlideCollection> {
        Ok(self.presentation_data()?.slides())
    }

    pub fn slide_masters(&self) -> Result<&PartCollection> {
        Ok(self.presentation_data()?.slide_masters())
    }

    #[inline]
    pub fn images(&self) -> &ImageCollection {
        &self.images
    }

    /// Reachable parts, each once, in depth-first order from the package
    /// relationships.
    pub fn parts(&self) -> Vec<PartId> {
        self.graph.walk()
    }

    /// Whether this package currently reaches `part`.
    pub fn contains(&self, part: PartId) -> bool {
        part.graph() == self.graph.stamp() && self.reach.read().contains(part.index())
    }

    pub fn part(&self, id: PartId) -> Result<&Part> {
        self.graph.part(id)
    }

    pub fn part_mut(&mut self, id: PartId) -> Result<&mut Part> {
        self.graph.part_mut(id)
    }

    #[inline]
    pub fn graph(&self) -> &PartGraph {
        &self.graph
    }

    /// Package-level relationships.
    #[inline]
    pub fn relationships(&self) -> &Relationships {
        self.graph.pkg_rels()
    }

    /// Relationships owned by the package or one of its parts.
    pub fn rels_of(&self, source: impl Into<Source>) -> Result<&Relationships> {
        self.graph.rels(source.into())
    }

    /// Append a new slide, seeded with the placeholders of `layout` when given.
    pub fn add_slide(&mut self, layout: Option<PartId>) -> Result<PartId> {
        let slide = SlideCollection::add_slide(&mut self.graph, self.presentation, layout)?;
        self.sync_reach()?;
        Ok(slide)
    }

    /// Image part for these bytes, added if the content is new.
    ///
    /// A new image is only saved once some reachable part relates to it, see
    /// [`relate`](Self::relate). Until then it is numbered after the images
    /// that are saved.
    pub fn add_image(&mut self, blob: &[u8]) -> Result<PartId> {
        self.add_image_from(ImageSource::Bytes(blob))
    }

    /// Image part for the content of an image file, added if new.
    pub fn add_image_file<P: AsRef<Path>>(&mut self, path: P) -> Result<PartId> {
        self.add_image_from(ImageSource::Path(path.as_ref()))
    }

    fn add_image_from(&mut self, source: ImageSource<'_>) -> Result<PartId> {
        let image = self.images.add(&mut self.graph, source)?;
        self.sync_reach()?;
        Ok(image)
    }

    /// Relate `source` to `target`, returning the relationship id.
    pub fn relate(&mut self, source: impl Into<Source>, reltype: &str, target: PartId) -> Result<String> {
        let r_id = self.graph.relate(source.into(), reltype, target)?;
        self.sync_reach()?;
        Ok(r_id)
    }

    /// Relate `source` to an external URL, returning the relationship id.
    pub fn relate_external(&mut self, source: impl Into<Source>, reltype: &str, url: &str) -> Result<String> {
        self.graph.relate_external(source.into(), reltype, url)
    }

    /// Remove relationship `r_id` from `source`.
    pub fn drop_relationship(&mut self, source: impl Into<Source>, r_id: &str) -> Result<Option<Relationship>> {
        let removed = self.graph.drop_relationship(source.into(), r_id)?;
        self.sync_reach()?;
        Ok(removed)
    }

    /// Keep the relationships of `source` grouped by type in this order, with
    /// contiguous ids.
    pub fn set_reltype_ordering<I, S>(&mut self, source: impl Into<Source>, ordering: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.graph.set_reltype_ordering(source.into(), ordering)
    }

    /// Recompute the reachable parts after an edit. When an image became
    /// reachable or unreachable, the images are renumbered so the saved media
    /// names run `image1..N` without gaps.
    fn sync_reach(&mut self) -> Result<()> {
        let reach: FixedBitSet = self.graph.reach();
        let images_moved = {
            let before = self.reach.read();
            self.images
                .iter()
                .any(|id| before.contains(id.index()) != reach.contains(id.index()))
        };
        if images_moved {
            self.images.renumber(&mut self.graph)?;
        }
        *self.reach.write() = reach;
        Ok(())
    }

    /// The reachable part graph in serialized form.
    pub fn to_serialized(&mut self) -> Result<SerializedPackage> {
        self.graph.to_serialized()
    }

    /// Write the package into any physical container.
    pub fn save_to<C: ContainerWriter + ?Sized>(&mut self, container: &mut C) -> Result<()> {
        let spkg = self.to_serialized()?;
        PackageWriter::write(container, &spkg)?;
        info!(package = %self.id, parts = spkg.len(), "saved package");
        Ok(())
    }

    /// Save the package as a .pptx file.
    #[cfg(feature = "zip")]
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        let mut writer = self.save_to_writer(BufWriter::new(file))?;
        writer.flush()?;
        Ok(())
    }

    /// Save the package as a ZIP stream, handing back the writer.
    #[cfg(feature = "zip")]
    pub fn save_to_writer<W: Write + Seek>(&mut self, writer: W) -> Result<W> {
        let mut container = ZipContainerWriter::new(writer);
        self.save_to(&mut container)?;
        Ok(container.finish()?)
    }
}

impl Drop for Package {
    fn drop(&mut self) {
        registry::unregister(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::Element;
    use crate::ooxml::opc::packuri::PackURI;
    use crate::ooxml::opc::phys_pkg::MemoryContainer;
    use crate::ooxml::opc::pkgreader::{SerializedPart, SerializedRelationship, SerializedTarget};
    use crate::ooxml::opc::constants::content_type as ct;
    use crate::ooxml::pptx::testing::{JPEG_BYTES, PNG_BYTES, PackageFixture};

    fn partname(pkg: &Package, id: PartId) -> String {
        pkg.part(id).unwrap().partname().unwrap().to_string()
    }

    fn first_layout(pkg: &Package) -> PartId {
        let master = pkg.slide_masters().unwrap().get(0).unwrap();
        pkg.part(master).unwrap().slide_layouts().unwrap().get(0).unwrap()
    }

    fn sld_ids(spkg: &SerializedPackage) -> Vec<String> {
        let prs = spkg.part(&PackURI::new("/ppt/presentation.xml").unwrap()).unwrap();
        Element::parse(&prs.blob)
            .unwrap()
            .child("p:sldIdLst")
            .map(|lst| lst.elements().filter_map(|e| e.attr("r:id")).map(str::to_string).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_new_package_from_template() {
        let pkg = Package::new().unwrap();
        assert!(pkg.slides().unwrap().is_empty());
        assert!(pkg.images().is_empty());
        assert_eq!(pkg.slide_masters().unwrap().len(), 1);

        let master = pkg.slide_masters().unwrap().get(0).unwrap();
        let names: Vec<_> = pkg
            .part(master)
            .unwrap()
            .slide_layouts()
            .unwrap()
            .iter()
            .map(|layout| pkg.part(layout).unwrap().name().to_string())
            .collect();
        assert_eq!(names, ["Title Slide", "Title and Content"]);
        assert_eq!(partname(&pkg, pkg.presentation()), "/ppt/presentation.xml");
        assert_eq!(pkg.parts().len(), 7);
    }

    #[test]
    fn test_add_slides_to_new_package() {
        let mut pkg = Package::new().unwrap();
        let layout = first_layout(&pkg);
        for _ in 0..3 {
            pkg.add_slide(Some(layout)).unwrap();
        }

        let names: Vec<_> = pkg.slides().unwrap().iter().map(|id| partname(&pkg, id)).collect();
        assert_eq!(names, ["/ppt/slides/slide1.xml", "/ppt/slides/slide2.xml", "/ppt/slides/slide3.xml"]);

        let prs_rels = pkg.rels_of(pkg.presentation()).unwrap();
        assert_eq!(prs_rels.of_type(rt::SLIDE).count(), 3);

        let slide = pkg.part(pkg.slides().unwrap().get(0).unwrap()).unwrap();
        assert_eq!(slide.slide_layout(), Some(layout));
        // Title and subtitle; date, footer and slide number are not copied
        assert_eq!(slide.shapes().unwrap().len(), 2);

        let spkg = pkg.to_serialized().unwrap();
        assert_eq!(sld_ids(&spkg).len(), 3);
    }

    #[test]
    fn test_containing_maps_parts_to_their_package() {
        let pkg = Package::from_serialized(&PackageFixture::new().slides(2).image("png", PNG_BYTES).build()).unwrap();
        let other = Package::new().unwrap();

        for id in pkg.parts() {
            assert_eq!(Package::containing(id).unwrap(), pkg.id());
        }
        for id in other.parts() {
            assert_eq!(Package::containing(id).unwrap(), other.id());
        }

        let instances = Package::instances();
        assert!(instances.contains(&pkg.id()));
        assert!(instances.contains(&other.id()));
    }

    #[test]
    fn test_containing_fails_after_drop() {
        let pkg = Package::new().unwrap();
        let id = pkg.id();
        let presentation = pkg.presentation();
        assert!(Package::instances().contains(&id));

        drop(pkg);
        assert!(matches!(
            Package::containing(presentation),
            Err(PptxError::PartNotOwned(part)) if part == presentation
        ));
        assert!(!Package::instances().contains(&id));
    }

    #[test]
    fn test_unrelated_image_is_not_owned_until_related() {
        let mut pkg = Package::new().unwrap();
        let slide = pkg.add_slide(None).unwrap();
        let image = pkg.add_image(PNG_BYTES).unwrap();

        assert!(!pkg.contains(image));
        assert!(matches!(Package::containing(image), Err(PptxError::PartNotOwned(_))));

        let r_id = pkg.relate(slide, rt::IMAGE, image).unwrap();
        assert_eq!(r_id, "rId1");
        assert!(pkg.contains(image));
        assert_eq!(Package::containing(image).unwrap(), pkg.id());

        pkg.drop_relationship(slide, &r_id).unwrap();
        assert!(!pkg.contains(image));
    }

    fn media_names(spkg: &SerializedPackage) -> Vec<String> {
        let mut names: Vec<_> = spkg
            .parts()
            .map(|p| p.partname.to_string())
            .filter(|name| name.starts_with("/ppt/media/"))
            .collect();
        names.sort();
        names
    }

    fn slide_names(spkg: &SerializedPackage) -> Vec<String> {
        let mut names: Vec<_> = spkg
            .parts()
            .map(|p| p.partname.to_string())
            .filter(|name| name.starts_with("/ppt/slides/"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_dropped_slide_leaves_no_gap() {
        let mut pkg = Package::from_serialized(&PackageFixture::new().slides(2).build()).unwrap();
        let first = pkg.slides().unwrap().get(0).unwrap();
        let second = pkg.slides().unwrap().get(1).unwrap();
        let r_id = pkg
            .rels_of(pkg.presentation())
            .unwrap()
            .iter()
            .find(|r| r.target_part() == Some(first))
            .map(|r| r.r_id().to_string())
            .unwrap();

        pkg.drop_relationship(pkg.presentation(), &r_id).unwrap();
        assert_eq!(pkg.slides().unwrap().parts().as_slice(), [second]);
        assert!(!pkg.contains(first));
        assert_eq!(partname(&pkg, second), "/ppt/slides/slide1.xml");

        let added = pkg.add_slide(None).unwrap();
        assert_eq!(partname(&pkg, added), "/ppt/slides/slide2.xml");

        let spkg = pkg.to_serialized().unwrap();
        assert_eq!(slide_names(&spkg), ["/ppt/slides/slide1.xml", "/ppt/slides/slide2.xml"]);
        assert_eq!(sld_ids(&spkg).len(), 2);
    }

    #[test]
    fn test_unrelated_image_takes_no_saved_number() {
        let mut pkg = Package::new().unwrap();
        let slide = pkg.add_slide(None).unwrap();
        let png = pkg.add_image(PNG_BYTES).unwrap();
        let jpeg = pkg.add_image(JPEG_BYTES).unwrap();
        pkg.relate(slide, rt::IMAGE, jpeg).unwrap();

        assert_eq!(partname(&pkg, jpeg), "/ppt/media/image1.jpg");
        assert_eq!(partname(&pkg, png), "/ppt/media/image2.png");
        assert_eq!(media_names(&pkg.to_serialized().unwrap()), ["/ppt/media/image1.jpg"]);

        pkg.relate(slide, rt::IMAGE, png).unwrap();
        assert_eq!(
            media_names(&pkg.to_serialized().unwrap()),
            ["/ppt/media/image1.jpg", "/ppt/media/image2.png"]
        );

        let r_id = pkg
            .rels_of(slide)
            .unwrap()
            .iter()
            .find(|r| r.target_part() == Some(jpeg))
            .map(|r| r.r_id().to_string())
            .unwrap();
        pkg.drop_relationship(slide, &r_id).unwrap();
        assert_eq!(media_names(&pkg.to_serialized().unwrap()), ["/ppt/media/image1.png"]);
        assert_eq!(pkg.add_image(JPEG_BYTES).unwrap(), jpeg);
    }

    #[test]
    fn test_images_collected_from_reachable_parts() {
        let spkg = PackageFixture::new()
            .slides(1)
            .image_named(2, "jpg", JPEG_BYTES)
            .image_named(1, "png", PNG_BYTES)
            .build();
        let mut pkg = Package::from_serialized(&spkg).unwrap();

        let names: Vec<_> = pkg.images().iter().map(|id| partname(&pkg, id)).collect();
        assert_eq!(names, ["/ppt/media/image1.png", "/ppt/media/image2.jpg"]);

        let again = pkg.add_image(JPEG_BYTES).unwrap();
        assert_eq!(partname(&pkg, again), "/ppt/media/image2.jpg");
        assert_eq!(pkg.images().len(), 2);
    }

    #[test]
    fn test_missing_document_relationship() {
        let core = PackURI::new("/docProps/core.xml").unwrap();
        let mut spkg = SerializedPackage::new();
        spkg.add_pkg_rel(SerializedRelationship::new(
            "rId1",
            rt::CORE_PROPERTIES,
            SerializedTarget::Part(core.clone()),
        ));
        spkg.add_part(SerializedPart::new(core, ct::OPC_CORE_PROPERTIES, "<cp:coreProperties/>"));

        assert!(matches!(Package::from_serialized(&spkg), Err(PptxError::NoDocumentPart)));
    }

    #[test]
    fn test_memory_container_round_trip() {
        let spkg = PackageFixture::new().slides(2).slide_rid_step(2).image("png", PNG_BYTES).hyperlink().build();
        let mut pkg = Package::from_serialized(&spkg).unwrap();
        let mut container = MemoryContainer::new();
        pkg.save_to(&mut container).unwrap();

        let mut reloaded = Package::from_container(&mut container).unwrap();
        assert_eq!(reloaded.slides().unwrap().len(), 2);
        assert_eq!(reloaded.images().len(), 1);

        let saved = reloaded.to_serialized().unwrap();
        for original in spkg.parts() {
            let copy = saved.part(&original.partname).unwrap();
            assert_eq!(copy.srels, original.srels, "{}", original.partname);
        }
        assert_eq!(sld_ids(&saved), ["rId3", "rId5"]);
    }

    #[cfg(feature = "zip")]
    #[test]
    fn test_save_and_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");

        let mut pkg = Package::new().unwrap();
        let layout = first_layout(&pkg);
        let slide = pkg.add_slide(Some(layout)).unwrap();
        let image = pkg.add_image(PNG_BYTES).unwrap();
        pkg.relate(slide, rt::IMAGE, image).unwrap();
        pkg.relate_external(slide, rt::HYPERLINK, "https://example.com/").unwrap();
        pkg.save(&path).unwrap();

        let opened = Package::open(&path).unwrap();
        assert_eq!(opened.slides().unwrap().len(), 1);
        let slide = opened.slides().unwrap().get(0).unwrap();
        assert_eq!(partname(&opened, slide), "/ppt/slides/slide1.xml");

        let slide_part = opened.part(slide).unwrap();
        let layout = slide_part.slide_layout().unwrap();
        assert_eq!(opened.part(layout).unwrap().name(), "Title Slide");
        assert_eq!(slide_part.rels().len(), 3);

        let images: Vec<_> = opened.images().iter().map(|id| partname(&opened, id)).collect();
        assert_eq!(images, ["/ppt/media/image1.png"]);
        let image = opened.part(opened.images().parts().get(0).unwrap()).unwrap();
        assert_eq!(image.blob().map(|b| &b[..]), Some(PNG_BYTES));
    }

    #[cfg(feature = "zip")]
    #[test]
    fn test_from_reader_and_save_to_writer() {
        let mut pkg = Package::new().unwrap();
        pkg.add_slide(None).unwrap();
        let cursor = pkg.save_to_writer(std::io::Cursor::new(Vec::new())).unwrap();

        let reopened = Package::from_reader(std::io::Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(reopened.slides().unwrap().len(), 1);
        assert_ne!(reopened.id(), pkg.id());
    }
}
