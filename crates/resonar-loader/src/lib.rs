//! Asynchronous, reference-counted loading of cooked audio assets.
//!
//! Cooked descriptors name the leaf resources (sound banks, media, external
//! sources) and group values each loadable unit depends on. The
//! [`ResourceLoader`] turns those descriptors into nodes, loads their
//! dependencies on a worker pool, and shares every leaf between all the
//! nodes that need it: the engine sees one registration per identity no
//! matter how many nodes hold it.
//!
//! # Overview
//!
//! - [`ResourceLoader`] - node creation, load and unload
//! - [`NodePtr`] - typed, non-cloneable handle to one node
//! - [`managers`] - reference-counted leaf pools over a sound engine
//! - [`DialogueEvent`] / [`AudioNodeObject`] - dynamic dialogue resolution
//! - [`Promise`] / [`Completion`] - one-shot results of asynchronous calls
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use std::sync::Arc;
//!
//! use resonar_cooked::{EventCookedData, MediaCookedData};
//! use resonar_loader::{LoaderConfig, ResourceLoader};
//! use resonar_test_utils::MockSoundEngine;
//!
//! let engine = Arc::new(MockSoundEngine::new());
//! let loader = ResourceLoader::new(LoaderConfig::default().with_worker_threads(2), engine.clone())
//!     .unwrap();
//!
//! let mut event = EventCookedData::new(1, "Play_Footstep");
//! event.media.push(MediaCookedData::new(10, "Footstep_01"));
//!
//! let node = loader.load_cooked(&event).wait().unwrap();
//! assert!(node.is_fully_loaded());
//! loader.unload(node).wait();
//!
//! assert!(loader.is_empty());
//! assert!(engine.is_idle());
//! loader.shutdown();
//! # }
//! ```

mod config;
pub mod dialogue;
mod error;
mod event;
mod handle;
mod loaded;
mod loader;
pub mod managers;
pub mod promise;
mod state;
mod storage;

pub use config::LoaderConfig;
pub use dialogue::{AudioNodeObject, DialogueEvent, KnownAudioNodes, build_argument_values};
pub use error::{LoaderError, LoaderResult};
pub use event::LoaderEvent;
pub use handle::{
    AudioNodePtr, AuxBusPtr, DialogueEventPtr, EventPtr, ExternalSourcePtr, GroupValuePtr,
    InitBankPtr, MediaPtr, NodeKind, NodePtr, NodeType, ShareSetPtr, SoundBankPtr, kind,
};
pub use loaded::{CookedSource, LeafIds, LeafSet, NodeDescriptor};
pub use loader::ResourceLoader;
pub use managers::{ResourceHandle, ResourceManager};
pub use promise::{Completion, Promise};
pub use state::NodeState;
