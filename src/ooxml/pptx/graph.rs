//! The part graph of a package.
//!
//! Parts are stored in an arena and addressed by [`PartId`]; relationships
//! name their targets by id. Relationship cycles (a slide layout and its
//! master point at each other) are therefore plain data, and every traversal
//! keeps a visited set keyed by part id.
//!
//! Each part remembers which sources hold a relationship to it. Renaming a
//! part through [`PartGraph::set_partname`] re-applies the ordering of every
//! such source collection that is in canonical order.

use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::error::OpcError;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{PartId, Source, next_graph_stamp};
use crate::ooxml::opc::pkgreader::{SerializedPackage, SerializedPart, SerializedRelationship, SerializedTarget};
use crate::ooxml::opc::rel::{RelTarget, Relationship, Relationships};
use crate::ooxml::pptx::collections::{PartCollection, SlideCollection};
use crate::ooxml::pptx::error::{PptxError, Result};
use crate::ooxml::pptx::parts::{Part, PartFactory, PartKind};
use fixedbitset::FixedBitSet;
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Arena of parts plus the package-level relationships.
#[derive(Debug)]
pub struct PartGraph {
    stamp: u32,
    parts: Vec<Part>,
    pkg_rels: Relationships,
}

impl Default for PartGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PartGraph {
    /// Create an empty graph with a fresh stamp.
    pub fn new() -> Self {
        Self {
            stamp: next_graph_stamp(),
            parts: Vec::new(),
            pkg_rels: Relationships::new(),
        }
    }

    /// Stamp shared by every [`PartId`] of this graph.
    #[inline]
    pub fn stamp(&self) -> u32 {
        self.stamp
    }

    /// Number of parts in the arena, reachable or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Add a new, unattached part of the given kind.
    pub fn insert(&mut self, kind: PartKind) -> PartId {
        let id = PartId::new(self.stamp, self.parts.len() as u32);
        self.parts.push(Part::new(id, kind));
        id
    }

    pub fn part(&self, id: PartId) -> Result<&Part> {
        if id.graph() != self.stamp {
            return Err(PptxError::UnknownPart(id));
        }
        self.parts.get(id.index()).ok_or(PptxError::UnknownPart(id))
    }

    pub fn part_mut(&mut self, id: PartId) -> Result<&mut Part> {
        if id.graph() != self.stamp {
            return Err(PptxError::UnknownPart(id));
        }
        self.parts.get_mut(id.index()).ok_or(PptxError::UnknownPart(id))
    }

    /// Every part in the arena, in creation order.
    pub fn iter(&self) -> std::slice::Iter<'_, Part> {
        self.parts.iter()
    }

    #[inline]
    pub fn pkg_rels(&self) -> &Relationships {
        &self.pkg_rels
    }

    /// Relationship collection owned by `source`.
    pub fn rels(&self, source: Source) -> Result<&Relationships> {
        match source {
            Source::Package => Ok(&self.pkg_rels),
            Source::Part(id) => Ok(self.part(id)?.rels()),
        }
    }

    fn rels_mut(&mut self, source: Source) -> Result<&mut Relationships> {
        match source {
            Source::Package => Ok(&mut self.pkg_rels),
            Source::Part(id) => Ok(self.part_mut(id)?.rels_mut()),
        }
    }

    /// Partname index of every part, by arena position.
    fn partname_indices(&self) -> Vec<Option<u32>> {
        self.parts.iter().map(Part::partname_idx).collect()
    }

    /// Add `rel` to the collection of `source` and register `source` as an
    /// observer of the target part. Returns the id the relationship ended up
    /// with, which differs from the given one under canonical order.
    ///
    /// # Errors
    ///
    /// [`OpcError::DuplicateRelationshipId`] (wrapped) if the id is in use,
    /// [`PptxError::UnknownPart`] if source or target is not in this graph.
    pub fn add_relationship(&mut self, source: Source, rel: Relationship) -> Result<String> {
        let target = rel.target_part();
        if let Some(target) = target {
            self.part(target)?;
        }

        // Indices are only consulted in canonical order
        let idx = if self.rels(source)?.is_canonical() {
            self.partname_indices()
        } else {
            Vec::new()
        };
        let stamp = self.stamp;
        let lookup = |id: PartId| {
            if id.graph() == stamp {
                idx.get(id.index()).copied().flatten()
            } else {
                None
            }
        };

        let r_id = self.rels_mut(source)?.add(rel, lookup)?.r_id().to_string();
        if let Some(target) = target {
            self.parts[target.index()].add_observer(source);
        }
        Ok(r_id)
    }

    /// Relate `source` to `target` under the next free id.
    pub fn relate(&mut self, source: Source, reltype: &str, target: PartId) -> Result<String> {
        let r_id = self.rels(source)?.next_free_id();
        self.add_relationship(source, Relationship::new(r_id, reltype, RelTarget::Part(target)))
    }

    /// Relate `source` to an external URL under the next free id.
    pub fn relate_external(&mut self, source: Source, reltype: &str, url: impl Into<String>) -> Result<String> {
        let r_id = self.rels(source)?.next_free_id();
        self.add_relationship(source, Relationship::new(r_id, reltype, RelTarget::External(url.into())))
    }

    /// Remove relationship `r_id` from `source`. The target part stays in the
    /// arena; it is simply no longer reached through this edge.
    ///
    /// When `source` no longer relates to the target at all, the target also
    /// leaves the typed views of `source`. Dropping a slide from a
    /// presentation renames the remaining slides `slide1..N`.
    pub fn drop_relationship(&mut self, source: Source, r_id: &str) -> Result<Option<Relationship>> {
        let idx = self.partname_indices();
        let lookup = |id: PartId| idx.get(id.index()).copied().flatten();

        let rels = self.rels_mut(source)?;
        let Some(removed) = rels.remove(r_id, lookup) else {
            return Ok(None);
        };
        if let Some(target) = removed.target_part()
            && !rels.targets(target)
        {
            self.part_mut(target)?.remove_observer(source);
            if let Source::Part(id) = source {
                self.unlink_related(id, removed.reltype(), target)?;
            }
        }
        Ok(Some(removed))
    }

    /// Take `target` out of the kind-specific views of `id`.
    fn unlink_related(&mut self, id: PartId, reltype: &str, target: PartId) -> Result<()> {
        let mut renamed = None;
        match self.part_mut(id)?.kind_mut() {
            PartKind::Presentation(prs) if reltype == rt::SLIDE => {
                if prs.slides.remove(target) {
                    renamed = Some(prs.slides.parts().clone());
                }
            },
            PartKind::Presentation(prs) if reltype == rt::SLIDE_MASTER => {
                prs.slide_masters.remove(target);
            },
            PartKind::Slide(slide) if reltype == rt::SLIDE_LAYOUT && slide.layout == Some(target) => {
                slide.layout = None;
            },
            PartKind::SlideLayout(layout) if reltype == rt::SLIDE_MASTER && layout.master == Some(target) => {
                layout.master = None;
            },
            PartKind::SlideMaster(master) if reltype == rt::SLIDE_LAYOUT => {
                master.layouts.remove(target);
            },
            _ => {},
        }

        if let Some(slides) = renamed {
            SlideCollection::rename_slides(self, &slides)?;
            debug!(part = %target, count = slides.len(), "dropped slide");
        }
        Ok(())
    }

    /// Install a relationship-type ordering on the collection of `source`.
    pub fn set_reltype_ordering<I, S>(&mut self, source: Source, ordering: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let idx = self.partname_indices();
        let lookup = |id: PartId| idx.get(id.index()).copied().flatten();
        self.rels_mut(source)?.set_reltype_ordering(ordering, lookup);
        Ok(())
    }

    /// Rename a part and re-sequence every canonical collection that targets it.
    pub fn set_partname(&mut self, id: PartId, partname: PackURI) -> Result<()> {
        let part = self.part_mut(id)?;
        part.assign_partname(partname);
        let observers: SmallVec<[Source; 4]> = SmallVec::from_slice(part.observers());

        let idx = self.partname_indices();
        let lookup = |id: PartId| idx.get(id.index()).copied().flatten();
        for source in observers {
            let rels = self.rels_mut(source)?;
            if rels.is_canonical() {
                rels.resequence(lookup);
                trace!(part = %id, ?source, "resequenced after rename");
            }
        }
        Ok(())
    }

    /// Parts reachable from the package relationships, each once, in
    /// depth-first pre-order. External targets are not followed.
    pub fn walk(&self) -> Vec<PartId> {
        let mut visited = FixedBitSet::with_capacity(self.parts.len());
        let mut order = Vec::new();
        let mut stack: Vec<PartId> = self.pkg_rels.iter().rev().filter_map(Relationship::target_part).collect();

        while let Some(id) = stack.pop() {
            if visited.put(id.index()) {
                continue;
            }
            order.push(id);
            let rels = self.parts[id.index()].rels();
            stack.extend(rels.iter().rev().filter_map(Relationship::target_part));
        }
        order
    }

    /// Bitset over arena positions of the parts [`walk`](Self::walk) reaches.
    pub fn reach(&self) -> FixedBitSet {
        let mut reach = FixedBitSet::with_capacity(self.parts.len());
        for id in self.walk() {
            reach.insert(id.index());
        }
        reach
    }

    /// Build a graph from a raw part graph.
    ///
    /// Depth-first from the package relationships: each partname becomes
    /// exactly one part, created through [`PartFactory`] the first time a
    /// relationship reaches it, and loaded (content, then relationships)
    /// before the relationship that reached it is added.
    pub fn load(spkg: &SerializedPackage) -> Result<Self> {
        let mut graph = Self::new();
        let mut loaded: HashMap<PackURI, PartId> = HashMap::with_capacity(spkg.len());
        graph.load_rels(spkg, Source::Package, spkg.pkg_srels(), &mut loaded)?;
        Ok(graph)
    }

    fn load_rels(
        &mut self,
        spkg: &SerializedPackage,
        source: Source,
        srels: &[SerializedRelationship],
        loaded: &mut HashMap<PackURI, PartId>,
    ) -> Result<()> {
        for srel in srels {
            let target = match &srel.target {
                SerializedTarget::External(url) => RelTarget::External(url.clone()),
                SerializedTarget::Part(partname) => {
                    RelTarget::Part(self.load_part(spkg, &srel.reltype, partname, loaded)?)
                },
            };
            self.add_relationship(source, Relationship::new(srel.r_id.clone(), srel.reltype.clone(), target))?;
        }
        Ok(())
    }

    fn load_part(
        &mut self,
        spkg: &SerializedPackage,
        reltype: &str,
        partname: &PackURI,
        loaded: &mut HashMap<PackURI, PartId>,
    ) -> Result<PartId> {
        if let Some(&id) = loaded.get(partname) {
            return Ok(id);
        }

        let spart = spkg
            .part(partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))?;
        let kind = PartFactory::part_kind(reltype, &spart.content_type)?;
        let id = self.insert(kind);
        self.parts[id.index()].load(spart)?;
        loaded.insert(partname.clone(), id);
        debug!(partname = %partname, kind = self.parts[id.index()].kind().name(), "loaded part");

        self.load_rels(spkg, Source::Part(id), &spart.srels, loaded)?;
        self.link_related(id);
        Ok(id)
    }

    /// Fill the kind-specific views of a just-loaded part from its relationships.
    fn link_related(&mut self, id: PartId) {
        let part = &self.parts[id.index()];
        if !(part.kind().is_slide_like() || matches!(part.kind(), PartKind::Presentation(_))) {
            return;
        }

        let related = |reltype: &str| -> Vec<(PartId, Option<u32>)> {
            part.rels()
                .of_type(reltype)
                .filter_map(Relationship::target_part)
                .map(|target| (target, self.parts[target.index()].partname_idx()))
                .collect()
        };
        let masters = related(rt::SLIDE_MASTER);
        let slides = related(rt::SLIDE);
        let layouts = related(rt::SLIDE_LAYOUT);

        match self.parts[id.index()].kind_mut() {
            PartKind::Presentation(prs) => {
                prs.slide_masters = PartCollection::from_indexed(masters);
                prs.slides = SlideCollection::from_parts(PartCollection::from_indexed(slides));
            },
            PartKind::Slide(slide) => slide.layout = layouts.first().map(|&(layout, _)| layout),
            PartKind::SlideLayout(layout) => layout.master = masters.first().map(|&(master, _)| master),
            PartKind::SlideMaster(master) => master.layouts = PartCollection::from_indexed(layouts),
            PartKind::Base | PartKind::Image(_) => {},
        }
    }

    /// The reachable part graph in serialized form, relationships in their
    /// current order. XML parts are serialized afresh, which for a
    /// presentation includes rebuilding its slide id list.
    pub fn to_serialized(&mut self) -> Result<SerializedPackage> {
        let mut spkg = SerializedPackage::new();
        for rel in self.pkg_rels.iter() {
            spkg.add_pkg_rel(self.serialize_rel(rel)?);
        }

        for id in self.walk() {
            let blob = self.parts[id.index()].to_blob()?;
            let part = &self.parts[id.index()];
            let mut spart = SerializedPart::new(part.partname()?.clone(), part.content_type()?, blob);
            for rel in part.rels() {
                spart.srels.push(self.serialize_rel(rel)?);
            }
            spkg.add_part(spart);
        }
        Ok(spkg)
    }

    fn serialize_rel(&self, rel: &Relationship) -> Result<SerializedRelationship> {
        let target = match rel.target() {
            RelTarget::Part(id) => SerializedTarget::Part(self.part(*id)?.partname()?.clone()),
            RelTarget::External(url) => SerializedTarget::External(url.clone()),
        };
        Ok(SerializedRelationship::new(rel.r_id(), rel.reltype(), target))
    }
}
