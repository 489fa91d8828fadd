//! Ordered part collections.
//!
//! A [`PartCollection`] lists parts in partname-index order, so
//! `slide9.xml` comes before `slide10.xml`. The image and slide collections
//! also own the partnames of their members and keep them numbered `1..N`
//! without gaps.

use crate::ooxml::opc::constants::{content_type_for_ext, content_type as ct, relationship_type as rt};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{PartId, Source};
use crate::ooxml::pptx::error::{PptxError, Result};
use crate::ooxml::pptx::format::sniff_image_ext;
use crate::ooxml::pptx::graph::PartGraph;
use crate::ooxml::pptx::parts::image::{self, ImageData};
use crate::ooxml::pptx::parts::slide::{SlideData, new_slide_element};
use crate::ooxml::pptx::parts::PartKind;
use crate::ooxml::pptx::shapes::clone_layout_placeholders;
use bytes::Bytes;
use std::path::Path;
use tracing::debug;

/// Parts in partname-index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartCollection {
    parts: Vec<PartId>,
}

impl PartCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection of `(part, partname index)` pairs, ordered by index.
    ///
    /// Parts with equal index keep their given order; unnumbered parts come
    /// first.
    pub fn from_indexed(mut members: Vec<(PartId, Option<u32>)>) -> Self {
        members.sort_by_key(|&(_, idx)| idx);
        Self {
            parts: members.into_iter().map(|(id, _)| id).collect(),
        }
    }

    /// Insert `part` in front of the first member with a greater index.
    pub fn insert_by_idx<F>(&mut self, part: PartId, idx: Option<u32>, idx_of: F)
    where
        F: Fn(PartId) -> Option<u32>,
    {
        let at = self
            .parts
            .iter()
            .position(|&member| idx_of(member) > idx)
            .unwrap_or(self.parts.len());
        self.parts.insert(at, part);
    }

    pub(crate) fn push(&mut self, part: PartId) {
        self.parts.push(part);
    }

    /// Remove `part`, keeping the order of the rest. False if it was absent.
    pub(crate) fn remove(&mut self, part: PartId) -> bool {
        match self.parts.iter().position(|&member| member == part) {
            Some(at) => {
                self.parts.remove(at);
                true
            },
            None => false,
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<PartId> {
        self.parts.get(index).copied()
    }

    #[inline]
    pub fn contains(&self, part: PartId) -> bool {
        self.parts.contains(&part)
    }

    #[inline]
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, PartId>> {
        self.parts.iter().copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[PartId] {
        &self.parts
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl<'a> IntoIterator for &'a PartCollection {
    type Item = PartId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, PartId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Where the content of a new image comes from.
#[derive(Debug, Clone, Copy)]
pub enum ImageSource<'a> {
    /// Raw image bytes; the format is sniffed from them.
    Bytes(&'a [u8]),
    /// An image file; the extension comes from the path.
    Path(&'a Path),
}

/// Image parts of a package, one per distinct image content.
#[derive(Debug, Clone, Default)]
pub struct ImageCollection {
    images: PartCollection,
}

impl ImageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection over the given image parts, in partname order.
    pub(crate) fn load(graph: &PartGraph, parts: impl IntoIterator<Item = PartId>) -> Self {
        let mut images = PartCollection::new();
        let idx_of = |id: PartId| graph.part(id).ok().and_then(|p| p.partname_idx());
        for id in parts {
            images.insert_by_idx(id, idx_of(id), idx_of);
        }
        Self { images }
    }

    /// Image part holding this content, added if new.
    ///
    /// Content already in the collection (by SHA-1) returns the existing part
    /// and changes nothing. New content becomes a new image part and every
    /// member is renamed to `/ppt/media/image<N>.<ext>`, `N` running from 1
    /// in collection order.
    ///
    /// # Errors
    ///
    /// [`PptxError::UnsupportedImageFormat`] for an extension that is not an
    /// image type or a format that cannot be embedded,
    /// [`PptxError::UnrecognizedImageFormat`] for bytes of no known format.
    pub fn add(&mut self, graph: &mut PartGraph, source: ImageSource<'_>) -> Result<PartId> {
        let blob: Bytes = match source {
            ImageSource::Bytes(bytes) => Bytes::copy_from_slice(bytes),
            ImageSource::Path(path) => Bytes::from(std::fs::read(path)?),
        };

        let sha1 = image::digest(&blob);
        if let Some(existing) = self.find(graph, &sha1) {
            return Ok(existing);
        }

        let ext = match source {
            ImageSource::Bytes(bytes) => sniff_image_ext(bytes)?.to_string(),
            ImageSource::Path(path) => path
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("")
                .to_string(),
        };
        let content_type = image_content_type(&ext)?;

        let id = graph.insert(PartKind::Image(ImageData::new(ext.as_str(), &blob)));
        let part = graph.part_mut(id)?;
        part.set_content_type(content_type);
        part.set_blob(blob);

        self.images.push(id);
        self.renumber(graph)?;
        debug!(part = %id, ext = %ext, count = self.images.len(), "added image");
        Ok(id)
    }

    fn find(&self, graph: &PartGraph, sha1: &image::ImageDigest) -> Option<PartId> {
        self.images.iter().find(|&id| {
            graph
                .part(id)
                .ok()
                .and_then(|p| p.image())
                .is_some_and(|image| image.sha1() == sha1)
        })
    }

    /// Rename every member to `/ppt/media/image<N>.<ext>`.
    ///
    /// Members reachable from the package root come first and take `1..K`
    /// in collection order, so a saved package numbers its media without
    /// gaps. Unreached members follow.
    pub(crate) fn renumber(&mut self, graph: &mut PartGraph) -> Result<()> {
        let reach = graph.reach();
        let (mut members, unreached): (Vec<PartId>, Vec<PartId>) =
            self.images.iter().partition(|id| reach.contains(id.index()));
        members.extend(unreached);
        self.images = PartCollection { parts: members };

        for (n, id) in self.images.iter().enumerate() {
            let ext = graph
                .part(id)?
                .image()
                .map(|image| image.ext().to_string())
                .unwrap_or_default();
            let partname = PackURI::new(format!("/ppt/media/image{}.{}", n + 1, ext))?;
            graph.set_partname(id, partname)?;
        }
        Ok(())
    }

    #[inline]
    pub fn parts(&self) -> &PartCollection {
        &self.images
    }

    #[inline]
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, PartId>> {
        self.images.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// MIME type for an image extension.
fn image_content_type(ext: &str) -> Result<&'static str> {
    match content_type_for_ext(ext) {
        Some(content_type) if content_type.starts_with("image/") => Ok(content_type),
        _ => Err(PptxError::UnsupportedImageFormat(ext.to_string())),
    }
}

/// Slides of a presentation, in presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideCollection {
    slides: PartCollection,
}

impl SlideCollection {
    pub(crate) fn from_parts(slides: PartCollection) -> Self {
        Self { slides }
    }

    /// Add a new slide to the presentation `prs`.
    ///
    /// The slide starts with an empty shape tree. Given a layout, it receives
    /// copies of the layout's placeholders and a relationship to the layout.
    /// All slides are then renamed `/ppt/slides/slide<N>.xml` in collection
    /// order and `prs` gains a relationship to the new slide.
    pub fn add_slide(graph: &mut PartGraph, prs: PartId, layout: Option<PartId>) -> Result<PartId> {
        let prs_kind = graph.part(prs)?.kind();
        if !matches!(prs_kind, PartKind::Presentation(_)) {
            return Err(PptxError::UnexpectedPartKind {
                part: prs,
                expected: "presentation",
                actual: prs_kind.name(),
            });
        }

        let mut element = new_slide_element();
        if let Some(layout) = layout {
            let layout_part = graph.part(layout)?;
            if !matches!(layout_part.kind(), PartKind::SlideLayout(_)) {
                return Err(PptxError::UnexpectedPartKind {
                    part: layout,
                    expected: "slide layout",
                    actual: layout_part.kind().name(),
                });
            }
            let layout_tree = layout_part.shapes().map(|shapes| shapes.sp_tree());
            let slide_tree = element.descend_mut(&["p:cSld", "p:spTree"]);
            if let (Some(layout_tree), Some(slide_tree)) = (layout_tree, slide_tree) {
                clone_layout_placeholders(slide_tree, layout_tree);
            }
        }

        let slide = graph.insert(PartKind::Slide(SlideData { layout }));
        let part = graph.part_mut(slide)?;
        part.set_content_type(ct::PML_SLIDE);
        part.set_element(element);
        if let Some(layout) = layout {
            graph.relate(Source::Part(slide), rt::SLIDE_LAYOUT, layout)?;
        }

        let slides = match graph.part_mut(prs)?.kind_mut() {
            PartKind::Presentation(data) => {
                data.slides.slides.push(slide);
                data.slides.slides.clone()
            },
            other => {
                return Err(PptxError::UnexpectedPartKind {
                    part: prs,
                    expected: "presentation",
                    actual: other.name(),
                });
            },
        };

        Self::rename_slides(graph, &slides)?;

        graph.relate(Source::Part(prs), rt::SLIDE, slide)?;
        debug!(part = %slide, count = slides.len(), "added slide");
        Ok(slide)
    }

    /// Rename `slides` to `/ppt/slides/slide<N>.xml`, `N` running from 1.
    pub(crate) fn rename_slides(graph: &mut PartGraph, slides: &PartCollection) -> Result<()> {
        let mut buf = itoa::Buffer::new();
        for (n, id) in slides.iter().enumerate() {
            let partname = PackURI::new(format!("/ppt/slides/slide{}.xml", buf.format(n + 1)))?;
            graph.set_partname(id, partname)?;
        }
        Ok(())
    }

    pub(crate) fn remove(&mut self, slide: PartId) -> bool {
        self.slides.remove(slide)
    }

    #[inline]
    pub fn parts(&self) -> &PartCollection {
        &self.slides
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<PartId> {
        self.slides.get(index)
    }

    #[inline]
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, PartId>> {
        self.slides.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

impl<'a> IntoIterator for &'a SlideCollection {
    type Item = PartId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, PartId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slides.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::testing::{PNG_BYTES, PackageFixture, JPEG_BYTES};

    fn loaded(fixture: PackageFixture) -> (PartGraph, PartId) {
        let graph = PartGraph::load(&fixture.build()).unwrap();
        let prs = graph.pkg_rels().part_with_reltype(rt::OFFICE_DOCUMENT).unwrap();
        (graph, prs)
    }

    fn partnames(graph: &PartGraph, parts: impl IntoIterator<Item = PartId>) -> Vec<String> {
        parts
            .into_iter()
            .map(|id| graph.part(id).unwrap().partname().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_part_collection_orders_by_index() {
        let p = |n| PartId::new(1, n);
        let collection = PartCollection::from_indexed(vec![(p(0), Some(10)), (p(1), Some(9)), (p(2), None), (p(3), Some(9))]);
        assert_eq!(collection.as_slice(), [p(2), p(1), p(3), p(0)]);

        let mut collection = PartCollection::new();
        let idx_of = |id: PartId| Some([10, 2, 9][id.index()]);
        for n in 0..3 {
            collection.insert_by_idx(p(n), idx_of(p(n)), idx_of);
        }
        assert_eq!(collection.as_slice(), [p(1), p(2), p(0)]);
        assert!(collection.contains(p(2)));
        assert_eq!(collection.get(1), Some(p(2)));
    }

    #[test]
    fn test_add_same_image_twice_is_idempotent() {
        let mut graph = PartGraph::new();
        let mut images = ImageCollection::new();

        let first = images.add(&mut graph, ImageSource::Bytes(PNG_BYTES)).unwrap();
        let second = images.add(&mut graph, ImageSource::Bytes(PNG_BYTES)).unwrap();
        assert_eq!(first, second);
        assert_eq!(images.len(), 1);
        assert_eq!(graph.len(), 1);

        let part = graph.part(first).unwrap();
        assert_eq!(part.partname().unwrap().as_str(), "/ppt/media/image1.png");
        assert_eq!(part.content_type().unwrap(), ct::PNG);
    }

    #[test]
    fn test_new_images_renumber_all_members() {
        let (mut graph, _) = loaded(PackageFixture::new().slides(1).image("png", PNG_BYTES).image_named(7, "gif", b"GIF89a\x01\x00"));
        let reached: Vec<_> = graph
            .walk()
            .into_iter()
            .filter(|&id| graph.part(id).unwrap().image().is_some())
            .collect();
        let mut images = ImageCollection::load(&graph, reached);
        assert_eq!(partnames(&graph, images.iter()), ["/ppt/media/image1.png", "/ppt/media/image7.gif"]);

        let jpeg = images.add(&mut graph, ImageSource::Bytes(JPEG_BYTES)).unwrap();
        assert_eq!(
            partnames(&graph, images.iter()),
            ["/ppt/media/image1.png", "/ppt/media/image2.gif", "/ppt/media/image3.jpg"]
        );
        assert_eq!(graph.part(jpeg).unwrap().content_type().unwrap(), ct::JPEG);
    }

    #[test]
    fn test_add_image_rejects_unsupported_content() {
        let mut graph = PartGraph::new();
        let mut images = ImageCollection::new();

        assert!(matches!(
            images.add(&mut graph, ImageSource::Bytes(b"not an image")),
            Err(PptxError::UnrecognizedImageFormat)
        ));
        assert!(matches!(
            images.add(&mut graph, ImageSource::Bytes(b"BM\x00\x00\x00\x00")),
            Err(PptxError::UnsupportedImageFormat(ref ext)) if ext == "bmp"
        ));
        assert!(images.is_empty());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_add_image_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("logo.png");
        std::fs::write(&png, PNG_BYTES).unwrap();
        let xlsx = dir.path().join("data.xlsx");
        std::fs::write(&xlsx, b"PK\x03\x04").unwrap();

        let mut graph = PartGraph::new();
        let mut images = ImageCollection::new();
        let id = images.add(&mut graph, ImageSource::Path(&png)).unwrap();
        assert_eq!(graph.part(id).unwrap().image().unwrap().ext(), "png");

        assert!(matches!(
            images.add(&mut graph, ImageSource::Path(&xlsx)),
            Err(PptxError::UnsupportedImageFormat(ref ext)) if ext == "xlsx"
        ));
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn test_add_slides_numbers_contiguously() {
        let (mut graph, prs) = loaded(PackageFixture::new());
        let layout = graph.part(prs).unwrap().rels().part_with_reltype(rt::SLIDE_MASTER).ok()
            .and_then(|master| graph.part(master).unwrap().slide_layouts().and_then(|l| l.get(0)));

        let mut added = Vec::new();
        for _ in 0..3 {
            added.push(SlideCollection::add_slide(&mut graph, prs, layout).unwrap());
        }
        assert_eq!(
            partnames(&graph, added.iter().copied()),
            ["/ppt/slides/slide1.xml", "/ppt/slides/slide2.xml", "/ppt/slides/slide3.xml"]
        );

        let rels = graph.part(prs).unwrap().rels();
        let targets: Vec<_> = rels.of_type(rt::SLIDE).filter_map(|r| r.target_part()).collect();
        assert_eq!(targets, added);

        let slide = graph.part(added[0]).unwrap();
        assert_eq!(slide.slide_layout(), layout);
        assert_eq!(slide.rels().part_with_reltype(rt::SLIDE_LAYOUT).ok(), layout);
        assert_eq!(slide.shapes().unwrap().placeholders().count(), 2);
    }

    #[test]
    fn test_add_slide_after_loaded_slides() {
        let (mut graph, prs) = loaded(PackageFixture::new().slides(2));
        let slide = SlideCollection::add_slide(&mut graph, prs, None).unwrap();

        let part = graph.part(slide).unwrap();
        assert_eq!(part.partname().unwrap().as_str(), "/ppt/slides/slide3.xml");
        assert!(part.rels().is_empty());
        assert!(part.shapes().unwrap().is_empty());
        let r_id = graph.part(prs).unwrap().rels().iter().find(|r| r.target_part() == Some(slide)).map(|r| r.r_id().to_string());
        assert_eq!(r_id.as_deref(), Some("rId5"));
    }

    #[test]
    fn test_add_slide_checks_part_kinds() {
        let (mut graph, prs) = loaded(PackageFixture::new().slides(1));
        let slide = graph.part(prs).unwrap().rels().part_with_reltype(rt::SLIDE).unwrap();

        assert!(matches!(
            SlideCollection::add_slide(&mut graph, prs, Some(slide)),
            Err(PptxError::UnexpectedPartKind { expected: "slide layout", .. })
        ));
        assert!(matches!(
            SlideCollection::add_slide(&mut graph, slide, None),
            Err(PptxError::UnexpectedPartKind { expected: "presentation", actual: "slide", .. })
        ));
    }
}
