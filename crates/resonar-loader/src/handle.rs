//! Typed pointers to loaded nodes.
//!
//! A [`NodePtr`] is the only way to refer to a node. It is not `Clone`:
//! creating an entry hands one out, loading consumes it and gives it back,
//! and unloading consumes it for good.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use resonar_core::alloc::slab::IndexSlot;
use resonar_cooked::LanguageCookedData;

use crate::loaded::{LeafIds, LoadedNode};
use crate::state::NodeState;

/// The kinds of node the loader manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    AudioNode,
    AuxBus,
    DialogueEvent,
    Event,
    ExternalSource,
    GroupValue,
    InitBank,
    Media,
    ShareSet,
    SoundBank,
}

impl NodeKind {
    pub const ALL: [NodeKind; 10] = [
        NodeKind::AudioNode,
        NodeKind::AuxBus,
        NodeKind::DialogueEvent,
        NodeKind::Event,
        NodeKind::ExternalSource,
        NodeKind::GroupValue,
        NodeKind::InitBank,
        NodeKind::Media,
        NodeKind::ShareSet,
        NodeKind::SoundBank,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::AudioNode => "AudioNode",
            NodeKind::AuxBus => "AuxBus",
            NodeKind::DialogueEvent => "DialogueEvent",
            NodeKind::Event => "Event",
            NodeKind::ExternalSource => "ExternalSource",
            NodeKind::GroupValue => "GroupValue",
            NodeKind::InitBank => "InitBank",
            NodeKind::Media => "Media",
            NodeKind::ShareSet => "ShareSet",
            NodeKind::SoundBank => "SoundBank",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type-level tag for a [`NodeKind`].
pub trait NodeType: Send + Sync + 'static {
    const KIND: NodeKind;
}

/// Zero-sized markers, one per [`NodeKind`].
pub mod kind {
    use super::{NodeKind, NodeType};

    macro_rules! node_types {
        ($($name:ident),* $(,)?) => {
            $(
                #[derive(Debug, Clone, Copy, PartialEq, Eq)]
                pub struct $name;

                impl NodeType for $name {
                    const KIND: NodeKind = NodeKind::$name;
                }
            )*
        };
    }

    node_types!(
        AudioNode,
        AuxBus,
        DialogueEvent,
        Event,
        ExternalSource,
        GroupValue,
        InitBank,
        Media,
        ShareSet,
        SoundBank,
    );
}

/// Owning reference to one node in the loader's storage.
pub struct NodePtr<K: NodeType> {
    slot: IndexSlot,
    node: Arc<LoadedNode>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: NodeType> NodePtr<K> {
    pub(crate) fn new(slot: IndexSlot, node: Arc<LoadedNode>) -> Self {
        Self {
            slot,
            node,
            _kind: PhantomData,
        }
    }

    pub(crate) fn node(&self) -> &Arc<LoadedNode> {
        &self.node
    }

    pub fn slot(&self) -> IndexSlot {
        self.slot
    }

    pub fn kind(&self) -> NodeKind {
        K::KIND
    }

    pub fn state(&self) -> NodeState {
        self.node.state()
    }

    /// The language the descriptor was selected for.
    pub fn language(&self) -> &LanguageCookedData {
        &self.node.descriptor.language
    }

    /// Loaded, and holding at least one resource or child (or declaring
    /// nothing to hold).
    pub fn is_loaded(&self) -> bool {
        self.node.is_loaded()
    }

    /// Loaded with no leaf failure in the node or its active branches.
    pub fn is_fully_loaded(&self) -> bool {
        self.node.is_fully_loaded()
    }

    /// Identities of every leaf currently held, for the event-posting layer.
    pub fn leaf_ids(&self) -> LeafIds {
        self.node.leaf_ids()
    }

    pub fn debug_string(&self) -> String {
        self.node.descriptor.debug_string.clone()
    }
}

impl<K: NodeType> fmt::Debug for NodePtr<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePtr")
            .field("kind", &K::KIND)
            .field("slot", &self.slot)
            .field("node", &self.node.descriptor.debug_string)
            .finish()
    }
}

pub type AudioNodePtr = NodePtr<kind::AudioNode>;
pub type AuxBusPtr = NodePtr<kind::AuxBus>;
pub type DialogueEventPtr = NodePtr<kind::DialogueEvent>;
pub type EventPtr = NodePtr<kind::Event>;
pub type ExternalSourcePtr = NodePtr<kind::ExternalSource>;
pub type GroupValuePtr = NodePtr<kind::GroupValue>;
pub type InitBankPtr = NodePtr<kind::InitBank>;
pub type MediaPtr = NodePtr<kind::Media>;
pub type ShareSetPtr = NodePtr<kind::ShareSet>;
pub type SoundBankPtr = NodePtr<kind::SoundBank>;
