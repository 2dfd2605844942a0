use parking_lot::Mutex;
use resonar_cooked::{ExternalSourceCookedData, MediaCookedData, SoundBankCookedData};
use std::sync::Arc;

use super::audio_node::LoadedAudioNode;
use super::descriptor::NodeDescriptor;
use crate::handle::{GroupValuePtr, NodeKind};
use crate::managers::ResourceHandle;
use crate::state::NodeState;

/// Leaf identities a node currently holds, sorted and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafIds {
    pub sound_banks: Vec<u32>,
    pub media: Vec<u32>,
    pub external_sources: Vec<u32>,
}

impl LeafIds {
    pub fn is_empty(&self) -> bool {
        self.sound_banks.is_empty() && self.media.is_empty() && self.external_sources.is_empty()
    }

    fn normalize(mut self) -> Self {
        for ids in [
            &mut self.sound_banks,
            &mut self.media,
            &mut self.external_sources,
        ] {
            ids.sort_unstable();
            ids.dedup();
        }
        self
    }
}

/// Handles to the leaves one node or branch acquired.
#[derive(Debug, Default)]
pub(crate) struct LoadedLeaves {
    pub(crate) sound_banks: Vec<ResourceHandle<SoundBankCookedData>>,
    pub(crate) media: Vec<ResourceHandle<MediaCookedData>>,
    pub(crate) external_sources: Vec<ResourceHandle<ExternalSourceCookedData>>,
    /// Leaves the engine refused.
    pub(crate) failed: usize,
}

impl LoadedLeaves {
    pub(crate) fn is_empty(&self) -> bool {
        self.sound_banks.is_empty() && self.media.is_empty() && self.external_sources.is_empty()
    }

    pub(crate) fn collect_ids(&self, ids: &mut LeafIds) {
        ids.sound_banks
            .extend(self.sound_banks.iter().map(ResourceHandle::leaf_id));
        ids.media.extend(self.media.iter().map(ResourceHandle::leaf_id));
        ids.external_sources
            .extend(self.external_sources.iter().map(ResourceHandle::leaf_id));
    }
}

#[derive(Debug, Default)]
pub(crate) struct LoadedData {
    pub(crate) state: NodeState,
    pub(crate) leaves: LoadedLeaves,
    pub(crate) children: Vec<GroupValuePtr>,
    pub(crate) audio_nodes: Vec<Arc<LoadedAudioNode>>,
    /// A reference on the descriptor's group value is held.
    pub(crate) group_value_held: bool,
}

/// One node in storage.
///
/// Lock order: a node's data before its children's data, and before any of
/// its audio nodes' state.
#[derive(Debug)]
pub(crate) struct LoadedNode {
    pub(crate) kind: NodeKind,
    pub(crate) descriptor: NodeDescriptor,
    pub(crate) data: Mutex<LoadedData>,
}

impl LoadedNode {
    pub(crate) fn new(kind: NodeKind, descriptor: NodeDescriptor) -> Self {
        Self {
            kind,
            descriptor,
            data: Mutex::new(LoadedData::default()),
        }
    }

    pub(crate) fn state(&self) -> NodeState {
        self.data.lock().state
    }

    pub(crate) fn advance(&self, to: NodeState) -> bool {
        let mut data = self.data.lock();
        let from = data.state;
        let advanced = data.state.advance(to);
        if !advanced {
            tracing::error!(
                "{}: unexpected transition {:?} -> {:?}",
                self.descriptor.debug_string,
                from,
                to
            );
        }
        advanced
    }

    pub(crate) fn is_loaded(&self) -> bool {
        let data = self.data.lock();
        if !data.state.is_loaded() {
            return false;
        }
        if !self.descriptor.has_dependencies() {
            return true;
        }
        // Attached branches count even while their conditions are unmet.
        !data.leaves.is_empty()
            || data.group_value_held
            || !data.audio_nodes.is_empty()
            || data.children.iter().any(GroupValuePtr::is_loaded)
    }

    pub(crate) fn is_fully_loaded(&self) -> bool {
        let data = self.data.lock();
        data.state.is_loaded()
            && data.leaves.failed == 0
            && data.children.len() == self.descriptor.required_group_values.len()
            && data.children.iter().all(GroupValuePtr::is_fully_loaded)
            && data.audio_nodes.iter().all(|node| node.failed() == 0)
    }

    pub(crate) fn leaf_ids(&self) -> LeafIds {
        let data = self.data.lock();
        let mut ids = LeafIds::default();
        data.leaves.collect_ids(&mut ids);
        for node in &data.audio_nodes {
            node.collect_ids(&mut ids);
        }
        ids.normalize()
    }
}
