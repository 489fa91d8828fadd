//! Low-level, read-only API to a serialized Open Packaging Convention (OPC) package.
//!
//! [`PackageReader`] turns a physical container into a [`SerializedPackage`]:
//! every part reachable from the package relationships, with its content type,
//! raw bytes and outgoing relationships, relative targets already resolved to
//! partnames. The object model is loaded from that raw graph.

use crate::ooxml::opc::constants::target_mode;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::ContainerReader;
use bytes::Bytes;
use quick_xml::Reader;
use quick_xml::events::Event;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Target of a serialized relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializedTarget {
    /// Absolute partname of the target part.
    Part(PackURI),
    /// External URL, stored verbatim.
    External(String),
}

/// Serialized relationship as read from (or written to) a .rels file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedRelationship {
    /// Relationship ID (e.g., "rId1")
    pub r_id: String,

    /// Relationship type URI
    pub reltype: String,

    pub target: SerializedTarget,
}

impl SerializedRelationship {
    pub fn new(r_id: impl Into<String>, reltype: impl Into<String>, target: SerializedTarget) -> Self {
        Self {
            r_id: r_id.into(),
            reltype: reltype.into(),
            target,
        }
    }

    /// Check if this is an external relationship.
    #[inline]
    pub fn is_external(&self) -> bool {
        matches!(self.target, SerializedTarget::External(_))
    }

    /// Partname of the target, `None` for an external relationship.
    #[inline]
    pub fn target_partname(&self) -> Option<&PackURI> {
        match &self.target {
            SerializedTarget::Part(partname) => Some(partname),
            SerializedTarget::External(_) => None,
        }
    }
}

/// Relationships from one source; most parts have only a handful.
pub type SerializedRels = SmallVec<[SerializedRelationship; 8]>;

/// Serialized part with its content and relationships.
#[derive(Debug, Clone)]
pub struct SerializedPart {
    /// The partname (URI) of this part
    pub partname: PackURI,

    /// The content type of this part
    pub content_type: String,

    /// The binary content of this part
    pub blob: Bytes,

    /// Outgoing relationships, in stored order
    pub srels: SerializedRels,
}

impl SerializedPart {
    pub fn new(partname: PackURI, content_type: impl Into<String>, blob: impl Into<Bytes>) -> Self {
        Self {
            partname,
            content_type: content_type.into(),
            blob: blob.into(),
            srels: SmallVec::new(),
        }
    }

    /// Builder-style helper appending an outgoing relationship.
    pub fn with_rel(mut self, srel: SerializedRelationship) -> Self {
        self.srels.push(srel);
        self
    }
}

/// A raw part/relationship graph, independent of any physical container.
///
/// Produced by [`PackageReader`] and consumed by [`PackageWriter`], and usable
/// directly as an in-memory container.
///
/// [`PackageWriter`]: crate::ooxml::opc::pkgwriter::PackageWriter
#[derive(Debug, Clone, Default)]
pub struct SerializedPackage {
    pkg_srels: SerializedRels,
    sparts: Vec<SerializedPart>,
    index: HashMap<PackURI, usize>,
}

impl SerializedPackage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a package-level relationship.
    pub fn add_pkg_rel(&mut self, srel: SerializedRelationship) {
        self.pkg_srels.push(srel);
    }

    /// Add a part, replacing any part already stored under the same partname.
    pub fn add_part(&mut self, spart: SerializedPart) {
        match self.index.get(&spart.partname) {
            Some(&pos) => self.sparts[pos] = spart,
            None => {
                self.index.insert(spart.partname.clone(), self.sparts.len());
                self.sparts.push(spart);
            },
        }
    }

    #[inline]
    pub fn pkg_srels(&self) -> &[SerializedRelationship] {
        &self.pkg_srels
    }

    pub fn part(&self, partname: &PackURI) -> Option<&SerializedPart> {
        self.index.get(partname).map(|&pos| &self.sparts[pos])
    }

    /// Parts in the order they were added.
    pub fn parts(&self) -> impl Iterator<Item = &SerializedPart> {
        self.sparts.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sparts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sparts.is_empty()
    }

    /// Drop relationships whose target part is not in the package.
    fn prune_dangling(&mut self) {
        let index = &self.index;
        let keep = |source: &str, srel: &SerializedRelationship| match srel.target_partname() {
            Some(partname) if !index.contains_key(partname) => {
                warn!(
                    source,
                    r_id = srel.r_id.as_str(),
                    target = partname.as_str(),
                    "skipping relationship to a part missing from the package"
                );
                false
            },
            _ => true,
        };
        self.pkg_srels.retain(|srel| keep(PACKAGE_URI, srel));
        for spart in &mut self.sparts {
            let source = spart.partname.as_str();
            spart.srels.retain(|srel| keep(source, srel));
        }
    }
}

/// Content type map for looking up content types by part name or extension.
///
/// Implements the OPC content type discovery algorithm using Default and Override elements
/// from [Content_Types].xml.
struct ContentTypeMap {
    /// Maps lowercase file extensions to default content types
    defaults: HashMap<String, String>,

    /// Maps specific partnames to override content types
    overrides: HashMap<String, String>,
}

impl ContentTypeMap {
    /// Parse content types from [Content_Types].xml.
    fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut map = Self {
            defaults: HashMap::new(),
            overrides: HashMap::new(),
        };
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let is_default = match e.local_name().as_ref() {
                        b"Default" => true,
                        b"Override" => false,
                        _ => continue,
                    };

                    let mut key = None;
                    let mut content_type = None;
                    for attr in e.attributes() {
                        let attr = attr?;
                        match attr.key.as_ref() {
                            b"Extension" | b"PartName" => {
                                key = Some(attr.unescape_value()?.into_owned());
                            },
                            b"ContentType" => {
                                content_type = Some(attr.unescape_value()?.into_owned());
                            },
                            _ => {},
                        }
                    }

                    if let (Some(key), Some(ct)) = (key, content_type) {
                        if is_default {
                            map.defaults.insert(key.to_lowercase(), ct);
                        } else {
                            map.overrides.insert(key, ct);
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(OpcError::XmlError(format!(
                        "Content types parse error: {}",
                        e
                    )));
                },
                _ => {},
            }
        }

        Ok(map)
    }

    /// Get the content type for a partname.
    ///
    /// First checks for an override, then falls back to the default
    /// based on file extension.
    fn get(&self, pack_uri: &PackURI) -> Result<&str> {
        if let Some(ct) = self.overrides.get(pack_uri.as_str()) {
            return Ok(ct);
        }

        self.defaults
            .get(&pack_uri.ext().to_lowercase())
            .map(String::as_str)
            .ok_or_else(|| OpcError::ContentTypeNotFound(pack_uri.to_string()))
    }
}

/// Builds a [`SerializedPackage`] from a physical container.
pub struct PackageReader;

impl PackageReader {
    /// Read every part reachable from the package relationships.
    ///
    /// Each part is read exactly once even if several relationships (or a
    /// cycle) lead to it. Relationships to parts missing from the container
    /// are dropped with a warning.
    pub fn read<C: ContainerReader + ?Sized>(container: &mut C) -> Result<SerializedPackage> {
        let content_types_xml = container
            .read_member(&CONTENT_TYPES_URI[1..])?
            .ok_or_else(|| OpcError::PartNotFound(CONTENT_TYPES_URI.to_string()))?;
        let content_types = ContentTypeMap::from_xml(&content_types_xml)?;

        let package_uri = PackURI::new(PACKAGE_URI)?;
        let pkg_srels = Self::load_rels(container, &package_uri)?;

        let mut package = SerializedPackage::new();
        let mut visited: HashSet<PackURI> = HashSet::with_capacity(32);
        let mut work_queue: Vec<PackURI> = Vec::with_capacity(pkg_srels.len());

        // Reverse so the stack pops targets in relationship order
        for srel in pkg_srels.iter().rev() {
            if let Some(partname) = srel.target_partname()
                && visited.insert(partname.clone())
            {
                work_queue.push(partname.clone());
            }
        }
        package.pkg_srels = pkg_srels;

        while let Some(partname) = work_queue.pop() {
            let Some(blob) = container.read_member(partname.membername())? else {
                continue;
            };
            let part_srels = Self::load_rels(container, &partname)?;

            for srel in part_srels.iter().rev() {
                if let Some(child) = srel.target_partname()
                    && visited.insert(child.clone())
                {
                    work_queue.push(child.clone());
                }
            }

            let content_type = content_types.get(&partname)?.to_string();
            package.add_part(SerializedPart {
                partname,
                content_type,
                blob,
                srels: part_srels,
            });
        }

        package.prune_dangling();
        Ok(package)
    }

    /// Load the relationships of `source_uri` from its .rels member, if any.
    fn load_rels<C: ContainerReader + ?Sized>(
        container: &mut C,
        source_uri: &PackURI,
    ) -> Result<SerializedRels> {
        let rels_uri = source_uri.rels_uri()?;
        match container.read_member(rels_uri.membername())? {
            Some(xml) => Self::parse_rels_xml(&xml, source_uri.base_uri()),
            None => Ok(SmallVec::new()),
        }
    }

    /// Parse relationships XML, resolving internal targets against `base_uri`.
    pub fn parse_rels_xml(rels_xml: &[u8], base_uri: &str) -> Result<SerializedRels> {
        let mut srels = SmallVec::new();
        let mut reader = Reader::from_reader(rels_xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    if e.local_name().as_ref() != b"Relationship" {
                        continue;
                    }

                    let mut r_id = None;
                    let mut reltype = None;
                    let mut target_ref = None;
                    let mut external = false;

                    for attr in e.attributes() {
                        let attr = attr?;
                        match attr.key.as_ref() {
                            b"Id" => r_id = Some(attr.unescape_value()?.into_owned()),
                            b"Type" => reltype = Some(attr.unescape_value()?.into_owned()),
                            b"Target" => target_ref = Some(attr.unescape_value()?.into_owned()),
                            b"TargetMode" => {
                                external = attr.unescape_value()? == target_mode::EXTERNAL;
                            },
                            _ => {},
                        }
                    }

                    if let (Some(r_id), Some(reltype), Some(target_ref)) = (r_id, reltype, target_ref) {
                        let target = if external {
                            SerializedTarget::External(target_ref)
                        } else {
                            SerializedTarget::Part(PackURI::from_rel_ref(base_uri, &target_ref)?)
                        };
                        srels.push(SerializedRelationship {
                            r_id,
                            reltype,
                            target,
                        });
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::XmlError(format!("Rels parse error: {}", e))),
                _ => {},
            }
        }

        Ok(srels)
    }
}
