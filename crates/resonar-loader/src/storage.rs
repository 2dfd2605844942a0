//! Per-kind node storage.

use std::sync::Arc;

use parking_lot::Mutex;
use resonar_core::alloc::slab::{IndexSlot, Slab};

use crate::handle::NodeKind;
use crate::loaded::LoadedNode;

/// One slab per [`NodeKind`].
///
/// Nodes live behind `Arc`s, so a node never moves while a pointer to it is
/// held; the slab only owns the registration.
pub(crate) struct NodeStorage {
    lists: [Mutex<Slab<Arc<LoadedNode>>>; NodeKind::ALL.len()],
}

impl NodeStorage {
    pub(crate) fn new() -> Self {
        Self {
            lists: std::array::from_fn(|_| Mutex::new(Slab::new())),
        }
    }

    pub(crate) fn insert(&self, node: Arc<LoadedNode>) -> IndexSlot {
        self.lists[node.kind.index()].lock().push(node)
    }

    pub(crate) fn remove(&self, kind: NodeKind, slot: IndexSlot) -> Option<Arc<LoadedNode>> {
        self.lists[kind.index()].lock().remove(slot)
    }

    pub(crate) fn len(&self, kind: NodeKind) -> usize {
        self.lists[kind.index()].lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lists.iter().all(|list| list.lock().is_empty())
    }

    /// Debug strings of every stored node, for leak reports.
    pub(crate) fn describe(&self) -> Vec<String> {
        self.lists
            .iter()
            .flat_map(|list| {
                list.lock()
                    .iter()
                    .map(|(_, node)| node.descriptor.debug_string.clone())
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
