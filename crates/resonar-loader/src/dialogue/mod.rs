//! Dynamic dialogue: argument marshalling, resolution through the engine,
//! and the audio node objects resolution hands out.

mod arguments;
mod audio_node_object;
mod dialogue_event;
mod known_nodes;

pub use arguments::{FALLBACK_ARGUMENT, build_argument_values};
pub use audio_node_object::AudioNodeObject;
pub use dialogue_event::DialogueEvent;
pub use known_nodes::KnownAudioNodes;
