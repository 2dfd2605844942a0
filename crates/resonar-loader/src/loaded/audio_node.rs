//! Audio nodes gated by a group-value condition.

use std::sync::Arc;

use parking_lot::Mutex;
use resonar_core::alloc::HashSet;
use resonar_cooked::{AudioNodeCookedData, GroupValueCookedData, GroupValueCookedDataSet};

use super::descriptor::LeafSet;
use super::node::{LeafIds, LoadedLeaves};
use crate::promise::Promise;

#[derive(Debug, Default)]
pub(crate) struct AudioNodeState {
    /// Condition members whose group value currently has holders.
    pub(crate) loaded_group_values: HashSet<GroupValueCookedData>,
    /// The owning node is loaded or loading.
    pub(crate) attached: bool,
    /// A reconcile task owns this branch.
    pub(crate) processing: bool,
    pub(crate) resident: Option<LoadedLeaves>,
    /// Fulfilled when the branch next stops processing.
    pub(crate) idle_waiters: Vec<Promise<()>>,
}

/// One branch of an event or dialogue event.
///
/// The branch's leaves are resident exactly while its owner is attached and
/// every group value in `condition` has at least one holder. The loader's
/// reconcile task converges `resident` on that target whenever either side
/// changes, so load order between the owner and the group values does not
/// matter.
#[derive(Debug)]
pub(crate) struct LoadedAudioNode {
    pub(crate) condition: GroupValueCookedDataSet,
    pub(crate) audio_node: AudioNodeCookedData,
    pub(crate) leaves: LeafSet,
    pub(crate) state: Mutex<AudioNodeState>,
}

impl LoadedAudioNode {
    pub(crate) fn new(
        condition: GroupValueCookedDataSet,
        audio_node: AudioNodeCookedData,
    ) -> Arc<Self> {
        Arc::new(Self {
            leaves: LeafSet::of_audio_node(&audio_node),
            condition,
            audio_node,
            state: Mutex::new(AudioNodeState::default()),
        })
    }

    pub(crate) fn have_all_keys(&self, state: &AudioNodeState) -> bool {
        let loaded = state.loaded_group_values.len();
        let required = self.condition.len();
        if loaded > required {
            tracing::error!(
                "{}: {} group values loaded for a condition of {}",
                self.audio_node.debug_string(),
                loaded,
                required
            );
            return true;
        }
        loaded == required
    }

    /// Whether the leaves should be resident right now.
    pub(crate) fn wanted(&self, state: &AudioNodeState) -> bool {
        state.attached && self.have_all_keys(state)
    }

    /// Leaves refused while resident.
    pub(crate) fn failed(&self) -> usize {
        self.state
            .lock()
            .resident
            .as_ref()
            .map_or(0, |leaves| leaves.failed)
    }

    pub(crate) fn collect_ids(&self, ids: &mut LeafIds) {
        if let Some(leaves) = &self.state.lock().resident {
            leaves.collect_ids(ids);
        }
    }
}
