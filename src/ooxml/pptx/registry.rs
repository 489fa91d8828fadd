//! Registry of live packages.
//!
//! Each [`Package`](crate::ooxml::pptx::Package) registers a non-owning handle
//! to its reachable-part set when constructed and unregisters it when dropped.
//! Lookups never keep a package alive; entries whose package is gone are
//! pruned on enumeration.

use crate::ooxml::opc::part::PartId;
use fixedbitset::FixedBitSet;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::{Arc, Weak};

/// Identity of a live package. Equal to the stamp of its part graph, so every
/// [`PartId`] the package hands out carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(u32);

impl PackageId {
    #[inline]
    pub(crate) fn new(stamp: u32) -> Self {
        Self(stamp)
    }

    #[inline]
    pub fn stamp(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "package#{}", self.0)
    }
}

/// Shared view of the part indices a package currently reaches.
pub(crate) type Reach = Arc<RwLock<FixedBitSet>>;

struct Entry {
    id: PackageId,
    reach: Weak<RwLock<FixedBitSet>>,
}

static REGISTRY: Lazy<Mutex<Vec<Entry>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub(crate) fn register(id: PackageId, reach: &Reach) {
    let mut entries = REGISTRY.lock();
    entries.retain(|entry| entry.id != id);
    entries.push(Entry {
        id,
        reach: Arc::downgrade(reach),
    });
}

pub(crate) fn unregister(id: PackageId) {
    REGISTRY.lock().retain(|entry| entry.id != id);
}

/// The live package whose reachable parts include `part`.
pub(crate) fn find(part: PartId) -> Option<PackageId> {
    let entries = REGISTRY.lock();
    entries.iter().find_map(|entry| {
        if entry.id.0 != part.graph() {
            return None;
        }
        let reach = entry.reach.upgrade()?;
        let reached = reach.read().contains(part.index());
        reached.then_some(entry.id)
    })
}

/// Every live package, in registration order.
pub(crate) fn live() -> Vec<PackageId> {
    let mut entries = REGISTRY.lock();
    entries.retain(|entry| entry.reach.strong_count() > 0);
    entries.iter().map(|entry| entry.id).collect()
}
