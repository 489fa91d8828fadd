use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::part::PartId;
/// Relationship-related objects for OPC packages.
///
/// A [`Relationships`] collection holds the outgoing edges of one source (a part
/// or the package). It keeps its members either in free order (ascending by the
/// numeric suffix of the rId, gaps preserved) or, once a relationship-type
/// ordering is installed, in canonical order with ids renumbered `rId1..rIdN`.
use tracing::trace;

/// Sort position of an rId without a numeric suffix.
const NON_NUMERIC_RID: u32 = u32::MAX;

/// Target of a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelTarget {
    /// A part in the same package.
    Part(PartId),
    /// An external URL (`TargetMode="External"`), e.g. a hyperlink.
    External(String),
}

/// A single relationship from a source to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    target: RelTarget,
}

impl Relationship {
    pub fn new(r_id: impl Into<String>, reltype: impl Into<String>, target: RelTarget) -> Self {
        Self {
            r_id: r_id.into(),
            reltype: reltype.into(),
            target,
        }
    }

    /// Get the relationship ID.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Get the relationship type.
    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    #[inline]
    pub fn target(&self) -> &RelTarget {
        &self.target
    }

    /// Target part, `None` for an external relationship.
    #[inline]
    pub fn target_part(&self) -> Option<PartId> {
        match self.target {
            RelTarget::Part(id) => Some(id),
            RelTarget::External(_) => None,
        }
    }

    /// Target URL of an external relationship.
    #[inline]
    pub fn external_ref(&self) -> Option<&str> {
        match &self.target {
            RelTarget::External(url) => Some(url),
            RelTarget::Part(_) => None,
        }
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        matches!(self.target, RelTarget::External(_))
    }

    /// Numeric suffix of the rId; ids not of the form `rId<N>` sort last.
    #[inline]
    pub fn num(&self) -> u32 {
        rid_num(&self.r_id).unwrap_or(NON_NUMERIC_RID)
    }
}

/// Parse the `N` out of `rId<N>`.
#[inline]
fn rid_num(r_id: &str) -> Option<u32> {
    r_id.strip_prefix("rId")
        .and_then(|digits| atoi_simd::parse::<u32>(digits.as_bytes()).ok())
}

/// Ordered collection of relationships from a single source.
///
/// Reordering needs the numeric partname index of each target part, which the
/// collection does not own; mutating operations therefore take a
/// `partname_idx` lookup supplied by the owning graph.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    rels: Vec<Relationship>,

    /// Installed relationship-type priority list; empty means free order.
    reltype_ordering: Vec<String>,
}

impl Relationships {
    /// Create a new empty collection in free order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relationship and re-apply the current ordering.
    ///
    /// Returns the added relationship as it stands after reordering; under
    /// canonical order its id may differ from the one it was added with.
    ///
    /// # Errors
    ///
    /// [`OpcError::DuplicateRelationshipId`] if the id is already in use.
    pub fn add<F>(&mut self, rel: Relationship, partname_idx: F) -> Result<&Relationship>
    where
        F: Fn(PartId) -> Option<u32>,
    {
        if self.get(&rel.r_id).is_some() {
            return Err(OpcError::DuplicateRelationshipId(rel.r_id));
        }
        self.rels.push(rel);
        let added = self.rels.len() - 1;
        let pos = self.reorder(partname_idx, Some(added)).unwrap_or(added);
        Ok(&self.rels[pos])
    }

    /// Remove a relationship by id and re-apply the current ordering.
    pub fn remove<F>(&mut self, r_id: &str, partname_idx: F) -> Option<Relationship>
    where
        F: Fn(PartId) -> Option<u32>,
    {
        let pos = self.rels.iter().position(|rel| rel.r_id == r_id)?;
        let removed = self.rels.remove(pos);
        self.reorder(partname_idx, None);
        Some(removed)
    }

    /// Lowest unused id of the form `rId<N>`, `N >= 1`.
    ///
    /// Fills the first gap in the used numbers, or returns one past the maximum.
    pub fn next_free_id(&self) -> String {
        let mut used: Vec<u32> = self.rels.iter().filter_map(|rel| rid_num(&rel.r_id)).collect();
        used.sort_unstable();

        let mut next = 1u32;
        for num in used {
            match num.cmp(&next) {
                std::cmp::Ordering::Equal => next += 1,
                std::cmp::Ordering::Greater => break,
                std::cmp::Ordering::Less => {},
            }
        }

        let mut buf = itoa::Buffer::new();
        let mut r_id = String::with_capacity(6);
        r_id.push_str("rId");
        r_id.push_str(buf.format(next));
        r_id
    }

    /// Members of the given type, in collection order.
    pub fn of_type<'a>(&'a self, reltype: &'a str) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.rels.iter().filter(move |rel| rel.reltype == reltype)
    }

    /// Target part of the first relationship of `reltype`.
    pub fn part_with_reltype(&self, reltype: &str) -> Result<PartId> {
        self.of_type(reltype)
            .find_map(Relationship::target_part)
            .ok_or_else(|| {
                OpcError::RelationshipNotFound(format!("No relationship of type '{}'", reltype))
            })
    }

    /// Install a relationship-type priority list and reorder immediately.
    ///
    /// A non-empty list switches to canonical order and renumbers ids to
    /// `rId1..rIdN`. An empty list reverts to free order, sorting by the
    /// existing ids without renumbering them.
    pub fn set_reltype_ordering<I, S, F>(&mut self, ordering: I, partname_idx: F)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(PartId) -> Option<u32>,
    {
        self.reltype_ordering = ordering.into_iter().map(Into::into).collect();
        self.reorder(partname_idx, None);
    }

    #[inline]
    pub fn reltype_ordering(&self) -> &[String] {
        &self.reltype_ordering
    }

    /// Whether canonical order is installed.
    #[inline]
    pub fn is_canonical(&self) -> bool {
        !self.reltype_ordering.is_empty()
    }

    /// Re-apply the current ordering, e.g. after a target part was renamed.
    pub fn resequence<F>(&mut self, partname_idx: F)
    where
        F: Fn(PartId) -> Option<u32>,
    {
        self.reorder(partname_idx, None);
    }

    /// Sort (and under canonical order, renumber) the members. Returns the new
    /// position of the member that was at `track`.
    fn reorder<F>(&mut self, partname_idx: F, track: Option<usize>) -> Option<usize>
    where
        F: Fn(PartId) -> Option<u32>,
    {
        let mut order: Vec<usize> = (0..self.rels.len()).collect();

        if self.is_canonical() {
            let unlisted = self.reltype_ordering.len();
            let keys: Vec<(usize, Option<u32>)> = self
                .rels
                .iter()
                .map(|rel| {
                    let rank = self
                        .reltype_ordering
                        .iter()
                        .position(|t| *t == rel.reltype)
                        .unwrap_or(unlisted);
                    (rank, rel.target_part().and_then(&partname_idx))
                })
                .collect();
            order.sort_by_key(|&i| keys[i]);
        } else {
            order.sort_by_key(|&i| self.rels[i].num());
        }

        let new_pos = track.and_then(|t| order.iter().position(|&i| i == t));

        let mut slots: Vec<Option<Relationship>> =
            std::mem::take(&mut self.rels).into_iter().map(Some).collect();
        self.rels = order.iter().filter_map(|&i| slots[i].take()).collect();

        if self.is_canonical() {
            let mut buf = itoa::Buffer::new();
            for (n, rel) in self.rels.iter_mut().enumerate() {
                rel.r_id.clear();
                rel.r_id.push_str("rId");
                rel.r_id.push_str(buf.format(n + 1));
            }
            trace!(count = self.rels.len(), "renumbered relationships in canonical order");
        }

        new_pos
    }

    /// Get a relationship by its ID.
    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.r_id == r_id)
    }

    /// Whether any member targets `part`.
    pub fn targets(&self, part: PartId) -> bool {
        self.rels.iter().any(|rel| rel.target_part() == Some(part))
    }

    /// Get an iterator over all relationships, in collection order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Relationship> {
        self.rels.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }
}

impl<'a> IntoIterator for &'a Relationships {
    type Item = &'a Relationship;
    type IntoIter = std::slice::Iter<'a, Relationship>;

    fn into_iter(self) -> Self::IntoIter {
        self.rels.iter()
    }
}
