/// Parts for PowerPoint presentation documents.
///
/// Every part in a package is a [`Part`]: a node carrying its content type,
/// partname, content (a parsed element tree for XML parts, raw bytes
/// otherwise) and its outgoing relationships. What kind of part it is, and
/// the state that kind carries, is the closed [`PartKind`] chosen once by
/// [`PartFactory`] when the part is created.
pub mod image;
pub mod presentation;
pub mod slide;

pub use image::{ImageData, ImageDigest};
pub use presentation::PresentationData;
pub use slide::{SlideData, SlideLayoutData, SlideMasterData};

use crate::common::xml::Element;
use crate::ooxml::opc::constants::{PRESENTATION_CONTENT_TYPES, relationship_type as rt};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{PartId, Source, is_xml_content_type};
use crate::ooxml::opc::pkgreader::SerializedPart;
use crate::ooxml::opc::rel::Relationships;
use crate::ooxml::pptx::collections::PartCollection;
use crate::ooxml::pptx::error::{PptxError, Result};
use crate::ooxml::pptx::shapes::ShapeCollection;
use bytes::Bytes;
use smallvec::SmallVec;

/// The kind of a part and its kind-specific state.
#[derive(Debug, Clone, Default)]
pub enum PartKind {
    /// Any part the object model does not interpret; its content round-trips.
    #[default]
    Base,
    Presentation(PresentationData),
    Slide(SlideData),
    SlideLayout(SlideLayoutData),
    SlideMaster(SlideMasterData),
    Image(ImageData),
}

impl PartKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Presentation(_) => "presentation",
            Self::Slide(_) => "slide",
            Self::SlideLayout(_) => "slide layout",
            Self::SlideMaster(_) => "slide master",
            Self::Image(_) => "image",
        }
    }

    /// Slide, slide layout or slide master.
    #[inline]
    pub fn is_slide_like(&self) -> bool {
        matches!(self, Self::Slide(_) | Self::SlideLayout(_) | Self::SlideMaster(_))
    }
}

/// Chooses the kind of a new part from the relationship that reaches it.
pub struct PartFactory;

impl PartFactory {
    /// Kind of the part targeted by a relationship of `reltype`.
    ///
    /// The primary document must be a presentation, template or slideshow.
    /// Slide, layout, master and image relationships select their kind
    /// regardless of content type; anything else is a base part.
    pub fn part_kind(reltype: &str, content_type: &str) -> Result<PartKind> {
        let kind = match reltype {
            rt::OFFICE_DOCUMENT => {
                if !PRESENTATION_CONTENT_TYPES.contains(&content_type) {
                    return Err(PptxError::UnsupportedDocumentContentType(content_type.to_string()));
                }
                PartKind::Presentation(PresentationData::default())
            },
            rt::SLIDE => PartKind::Slide(SlideData::default()),
            rt::SLIDE_LAYOUT => PartKind::SlideLayout(SlideLayoutData::default()),
            rt::SLIDE_MASTER => PartKind::SlideMaster(SlideMasterData::default()),
            // Digest and extension are filled in by `Part::load`
            rt::IMAGE => PartKind::Image(ImageData::new("", &[])),
            _ => PartKind::Base,
        };
        Ok(kind)
    }
}

/// A part in a package graph.
///
/// Content type and partname start out unassigned for parts created in memory;
/// reading either before it is set is reported as
/// [`PptxError::UnassignedField`].
#[derive(Debug, Clone)]
pub struct Part {
    id: PartId,
    kind: PartKind,
    content_type: Option<String>,
    partname: Option<PackURI>,
    element: Option<Element>,
    blob: Option<Bytes>,
    rels: Relationships,
    /// Sources holding at least one relationship to this part.
    observers: SmallVec<[Source; 4]>,
}

impl Part {
    pub(crate) fn new(id: PartId, kind: PartKind) -> Self {
        Self {
            id,
            kind,
            content_type: None,
            partname: None,
            element: None,
            blob: None,
            rels: Relationships::new(),
            observers: SmallVec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> PartId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> &PartKind {
        &self.kind
    }

    #[inline]
    pub(crate) fn kind_mut(&mut self) -> &mut PartKind {
        &mut self.kind
    }

    /// Content type of this part, e.g. `application/vnd.openxmlformats-officedocument.theme+xml`.
    pub fn content_type(&self) -> Result<&str> {
        self.content_type.as_deref().ok_or(PptxError::UnassignedField {
            field: "content type",
            part: self.id,
        })
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = Some(content_type.into());
    }

    /// Partname of this part, e.g. `/ppt/slides/slide1.xml`.
    pub fn partname(&self) -> Result<&PackURI> {
        self.partname.as_ref().ok_or(PptxError::UnassignedField {
            field: "partname",
            part: self.id,
        })
    }

    /// Numeric index of the partname, `None` if unassigned or unnumbered.
    #[inline]
    pub fn partname_idx(&self) -> Option<u32> {
        self.partname.as_ref().and_then(PackURI::idx)
    }

    /// Store a partname without notifying anyone; the graph does the notifying.
    pub(crate) fn assign_partname(&mut self, partname: PackURI) {
        self.partname = Some(partname);
    }

    /// Parsed content of an XML part.
    #[inline]
    pub fn element(&self) -> Option<&Element> {
        self.element.as_ref()
    }

    #[inline]
    pub fn element_mut(&mut self) -> Option<&mut Element> {
        self.element.as_mut()
    }

    pub fn set_element(&mut self, element: Element) {
        self.element = Some(element);
        self.blob = None;
    }

    /// Raw content of a binary part.
    #[inline]
    pub fn blob(&self) -> Option<&Bytes> {
        self.blob.as_ref()
    }

    pub fn set_blob(&mut self, blob: impl Into<Bytes>) {
        self.blob = Some(blob.into());
        self.element = None;
    }

    /// Outgoing relationships of this part.
    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub(crate) fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    #[inline]
    pub(crate) fn observers(&self) -> &[Source] {
        &self.observers
    }

    pub(crate) fn add_observer(&mut self, source: Source) {
        if !self.observers.contains(&source) {
            self.observers.push(source);
        }
    }

    pub(crate) fn remove_observer(&mut self, source: Source) {
        self.observers.retain(|s| *s != source);
    }

    /// Fill this part from its serialized form. Relationships are loaded by
    /// the graph walk, not here.
    ///
    /// # Errors
    ///
    /// [`PptxError::MalformedPart`] if XML content does not parse.
    pub(crate) fn load(&mut self, spart: &SerializedPart) -> Result<()> {
        self.content_type = Some(spart.content_type.clone());
        self.partname = Some(spart.partname.clone());

        if is_xml_content_type(&spart.content_type) {
            let element = Element::parse(&spart.blob).map_err(|e| PptxError::MalformedPart {
                partname: spart.partname.to_string(),
                reason: e.to_string(),
            })?;
            self.element = Some(element);
        } else {
            self.blob = Some(spart.blob.clone());
        }

        if let PartKind::Image(image) = &mut self.kind {
            *image = ImageData::new(spart.partname.ext(), &spart.blob);
        }
        Ok(())
    }

    /// Serialized content of this part.
    ///
    /// A presentation first rebuilds its slide id list from its current slide
    /// relationships.
    pub fn to_blob(&mut self) -> Result<Bytes> {
        if let (PartKind::Presentation(_), Some(element)) = (&self.kind, self.element.as_mut()) {
            presentation::rewrite_sld_id_lst(element, &self.rels);
        }

        match (&self.element, &self.blob) {
            (Some(element), _) => Ok(Bytes::from(element.to_xml())),
            (None, Some(blob)) => Ok(blob.clone()),
            (None, None) => Err(PptxError::UnassignedField {
                field: "content",
                part: self.id,
            }),
        }
    }

    /// Internal name of a slide, layout or master (`p:cSld/@name`), empty when
    /// absent or for other kinds of part.
    pub fn name(&self) -> &str {
        self.element
            .as_ref()
            .and_then(|e| e.child("p:cSld"))
            .and_then(|c_sld| c_sld.attr("name"))
            .unwrap_or("")
    }

    /// Shapes of a slide, layout or master.
    pub fn shapes(&self) -> Option<ShapeCollection<'_>> {
        if !self.kind.is_slide_like() {
            return None;
        }
        self.element
            .as_ref()
            .and_then(|e| e.descend(&["p:cSld", "p:spTree"]))
            .map(ShapeCollection::new)
    }

    /// Image state, if this is an image part.
    pub fn image(&self) -> Option<&ImageData> {
        match &self.kind {
            PartKind::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Layout of a slide.
    pub fn slide_layout(&self) -> Option<PartId> {
        match &self.kind {
            PartKind::Slide(slide) => slide.slide_layout(),
            _ => None,
        }
    }

    /// Master of a slide layout.
    pub fn slide_master(&self) -> Option<PartId> {
        match &self.kind {
            PartKind::SlideLayout(layout) => layout.slide_master(),
            _ => None,
        }
    }

    /// Layouts of a slide master.
    pub fn slide_layouts(&self) -> Option<&PartCollection> {
        match &self.kind {
            PartKind::SlideMaster(master) => Some(master.slide_layouts()),
            _ => None,
        }
    }
}
