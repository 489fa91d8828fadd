/// Part identity within a package graph.
///
/// Parts live in an arena owned by their package; relationships and
/// collections refer to them by [`PartId`] rather than by reference, which keeps
/// cyclic graphs (layout -> master -> layout) free of ownership cycles.
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_GRAPH_STAMP: AtomicU32 = AtomicU32::new(1);

/// Allocate a process-unique stamp for a new part arena.
pub(crate) fn next_graph_stamp() -> u32 {
    NEXT_GRAPH_STAMP.fetch_add(1, Ordering::Relaxed)
}

/// Handle to a part in a specific package graph.
///
/// The graph stamp makes handles from different packages (or from a graph that
/// has since been reloaded) distinguishable, so a stale handle is reported
/// instead of silently resolving to an unrelated part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId {
    graph: u32,
    index: u32,
}

impl PartId {
    #[inline]
    pub(crate) fn new(graph: u32, index: u32) -> Self {
        Self { graph, index }
    }

    /// Stamp of the graph this handle belongs to.
    #[inline]
    pub fn graph(&self) -> u32 {
        self.graph
    }

    /// Position of the part in its graph's arena.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl std::fmt::Display for PartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "part#{}.{}", self.graph, self.index)
    }
}

/// Owner of a relationship collection: the package itself or one of its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Package,
    Part(PartId),
}

impl From<PartId> for Source {
    fn from(id: PartId) -> Self {
        Source::Part(id)
    }
}

/// Whether a content type denotes XML content that should be parsed.
///
/// True for types ending in `+xml` or `/xml`.
#[inline]
pub fn is_xml_content_type(content_type: &str) -> bool {
    content_type.ends_with("+xml") || content_type.ends_with("/xml")
}
