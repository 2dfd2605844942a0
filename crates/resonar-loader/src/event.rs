//! Loader events for observers and tests.

use parking_lot::Mutex;
use resonar_core::alloc::slab::IndexSlot;
use resonar_test_utils::LeafKind;

use crate::handle::NodeKind;

/// Events emitted by the loader when event recording is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderEvent {
    /// A node finished loading.
    NodeLoaded {
        kind: NodeKind,
        slot: IndexSlot,
        /// Whether every leaf was acquired.
        fully_loaded: bool,
    },

    /// A node finished unloading and was freed.
    NodeUnloaded { kind: NodeKind, slot: IndexSlot },

    /// A leaf could not be registered with the sound engine.
    LeafFailed { kind: LeafKind, id: u32 },
}

impl LoaderEvent {
    /// The node kind this event relates to, if any.
    pub fn node_kind(&self) -> Option<NodeKind> {
        match self {
            LoaderEvent::NodeLoaded { kind, .. } | LoaderEvent::NodeUnloaded { kind, .. } => {
                Some(*kind)
            }
            LoaderEvent::LeafFailed { .. } => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoaderEvent::NodeLoaded { .. })
    }

    pub fn is_unloaded(&self) -> bool {
        matches!(self, LoaderEvent::NodeUnloaded { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, LoaderEvent::LeafFailed { .. })
    }
}

/// Buffer for loader events. Disabled buffers drop everything.
#[derive(Debug, Default)]
pub(crate) struct EventBuffer {
    enabled: bool,
    events: Mutex<Vec<LoaderEvent>>,
}

impl EventBuffer {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, event: LoaderEvent) {
        if self.enabled {
            self.events.lock().push(event);
        }
    }

    pub(crate) fn drain(&self) -> Vec<LoaderEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_buffer_drops_events() {
        let buffer = EventBuffer::new(false);
        buffer.push(LoaderEvent::LeafFailed {
            kind: LeafKind::Media,
            id: 1,
        });
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn test_drain_empties_buffer() {
        let buffer = EventBuffer::new(true);
        buffer.push(LoaderEvent::LeafFailed {
            kind: LeafKind::Media,
            id: 1,
        });
        let events = buffer.drain();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_failure());
        assert_eq!(events[0].node_kind(), None);
        assert!(buffer.drain().is_empty());
    }
}
