//! Reference counts for group values and the branches they gate.

use std::sync::Arc;

use parking_lot::Mutex;
use resonar_core::alloc::HashMap;
use resonar_cooked::GroupValueCookedData;

use super::audio_node::LoadedAudioNode;

#[derive(Debug, Default)]
struct LoadedGroupValueKey {
    /// Nodes holding this group value.
    count: usize,
    /// Attached branches whose condition contains this group value.
    audio_nodes: Vec<Arc<LoadedAudioNode>>,
}

impl LoadedGroupValueKey {
    fn is_held(&self) -> bool {
        self.count > 0
    }

    fn is_unused(&self) -> bool {
        self.count == 0 && self.audio_nodes.is_empty()
    }
}

/// Registry of group values shared by every node in one loader.
///
/// Methods return the branches whose condition changed; the caller has to
/// reconcile them once the registry lock is released. Lock order: the
/// registry before any branch state.
#[derive(Debug, Default)]
pub(crate) struct GroupValueRegistry {
    keys: Mutex<HashMap<GroupValueCookedData, LoadedGroupValueKey>>,
}

impl GroupValueRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a holder to `value`.
    ///
    /// Every holder gets the gated branches back, so its load only completes
    /// once those branches have settled.
    pub(crate) fn load(&self, value: &GroupValueCookedData) -> Vec<Arc<LoadedAudioNode>> {
        let mut keys = self.keys.lock();
        let key = keys.entry(value.clone()).or_default();
        key.count += 1;
        if key.count == 1 {
            tracing::trace!(
                "{} now held, {} branches affected",
                value.debug_string(),
                key.audio_nodes.len()
            );
            for node in &key.audio_nodes {
                node.state.lock().loaded_group_values.insert(value.clone());
            }
        }
        key.audio_nodes.clone()
    }

    /// Drop a holder from `value`.
    pub(crate) fn unload(&self, value: &GroupValueCookedData) -> Vec<Arc<LoadedAudioNode>> {
        let mut keys = self.keys.lock();
        let Some(key) = keys.get_mut(value).filter(|key| key.is_held()) else {
            tracing::error!("{} unloaded without a holder", value.debug_string());
            return Vec::new();
        };
        key.count -= 1;
        if key.is_held() {
            return Vec::new();
        }

        for node in &key.audio_nodes {
            node.state.lock().loaded_group_values.remove(value);
        }
        let affected = key.audio_nodes.clone();
        if key.is_unused() {
            keys.remove(value);
        }
        affected
    }

    /// Start tracking `node`'s condition and mark it attached.
    pub(crate) fn attach(&self, node: &Arc<LoadedAudioNode>) {
        let mut keys = self.keys.lock();
        let mut state = node.state.lock();
        state.attached = true;
        for value in node.condition.iter() {
            let key = keys.entry(value.clone()).or_default();
            key.audio_nodes.push(node.clone());
            if key.is_held() {
                state.loaded_group_values.insert(value.clone());
            }
        }
    }

    /// Stop tracking `node` and mark it detached.
    pub(crate) fn detach(&self, node: &Arc<LoadedAudioNode>) {
        let mut keys = self.keys.lock();
        let mut state = node.state.lock();
        state.attached = false;
        for value in node.condition.iter() {
            if let Some(key) = keys.get_mut(value) {
                key.audio_nodes.retain(|other| !Arc::ptr_eq(other, node));
                if key.is_unused() {
                    keys.remove(value);
                }
            }
            state.loaded_group_values.remove(value);
        }
    }

    pub(crate) fn holders(&self, value: &GroupValueCookedData) -> usize {
        self.keys.lock().get(value).map_or(0, |key| key.count)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resonar_cooked::AudioNodeCookedData;

    fn gated(value: &GroupValueCookedData) -> Arc<LoadedAudioNode> {
        LoadedAudioNode::new(
            [value.clone()].into_iter().collect(),
            AudioNodeCookedData::new(3, "gated"),
        )
    }

    #[test]
    fn test_every_holder_waits_for_gated_branches() {
        let registry = GroupValueRegistry::new();
        let value = GroupValueCookedData::switch(1, 2);
        let node = gated(&value);
        registry.attach(&node);

        assert_eq!(registry.load(&value).len(), 1);
        assert_eq!(registry.load(&value).len(), 1);
        assert_eq!(registry.holders(&value), 2);
        assert!(node.wanted(&node.state.lock()));

        assert!(registry.unload(&value).is_empty());
        assert_eq!(registry.unload(&value).len(), 1);
        assert!(!node.wanted(&node.state.lock()));

        registry.detach(&node);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_attach_after_load_sees_held_value() {
        let registry = GroupValueRegistry::new();
        let value = GroupValueCookedData::state(4, 5);
        assert!(registry.load(&value).is_empty());
        assert!(registry.load(&value).is_empty());

        let node = gated(&value);
        registry.attach(&node);
        assert!(node.wanted(&node.state.lock()));

        registry.detach(&node);
        assert!(!registry.is_empty());
        registry.unload(&value);
        registry.unload(&value);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unbalanced_unload_is_ignored() {
        let registry = GroupValueRegistry::new();
        let value = GroupValueCookedData::switch(8, 8);
        assert!(registry.unload(&value).is_empty());
        assert!(registry.is_empty());
    }
}
