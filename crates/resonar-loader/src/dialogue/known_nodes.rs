use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use resonar_core::alloc::HashMap;

use super::AudioNodeObject;

/// Cache of audio node objects by id, shared by every dialogue event of one
/// loader.
///
/// Entries are weak: an object lives as long as some dialogue event (or the
/// caller) holds it. The cache only accepts entries between [`init`] and
/// [`shutdown`].
///
/// [`init`]: KnownAudioNodes::init
/// [`shutdown`]: KnownAudioNodes::shutdown
#[derive(Debug, Default)]
pub struct KnownAudioNodes {
    nodes: Mutex<Option<HashMap<u32, Weak<AudioNodeObject>>>>,
}

impl KnownAudioNodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&self) {
        let mut nodes = self.nodes.lock();
        if nodes.is_none() {
            *nodes = Some(HashMap::new());
        }
    }

    /// Forget every entry and refuse new ones.
    pub fn shutdown(&self) {
        self.nodes.lock().take();
    }

    pub fn is_active(&self) -> bool {
        self.nodes.lock().is_some()
    }

    pub fn get(&self, audio_node_id: u32) -> Option<Arc<AudioNodeObject>> {
        self.nodes
            .lock()
            .as_ref()?
            .get(&audio_node_id)
            .and_then(Weak::upgrade)
    }

    pub fn insert(&self, audio_node_id: u32, object: &Arc<AudioNodeObject>) {
        let mut nodes = self.nodes.lock();
        let Some(nodes) = nodes.as_mut() else {
            tracing::debug!("Audio node {} not cached, registry is shut down", audio_node_id);
            return;
        };
        nodes.retain(|_, weak| weak.strong_count() > 0);
        nodes.insert(audio_node_id, Arc::downgrade(object));
    }

    /// Live entries.
    pub fn len(&self) -> usize {
        self.nodes.lock().as_ref().map_or(0, |nodes| {
            nodes.values().filter(|weak| weak.strong_count() > 0).count()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
