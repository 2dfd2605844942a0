//! Runtime records for loaded nodes.

mod audio_node;
mod descriptor;
mod group_value_key;
mod node;

pub(crate) use audio_node::LoadedAudioNode;
pub use descriptor::{CookedSource, LeafSet, NodeDescriptor};
pub(crate) use group_value_key::GroupValueRegistry;
pub use node::LeafIds;
pub(crate) use node::{LoadedLeaves, LoadedNode};
