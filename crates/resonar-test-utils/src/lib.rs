//! Sound engine abstraction and test doubles for Resonar.
//!
//! The loader never talks to a concrete audio engine. It registers and
//! unregisters leaf resources through [`SoundEngine`] and resolves dialogue
//! paths through [`DynamicDialogue`], both object-safe so production code
//! and tests can hand in `Arc<dyn ...>`.
//!
//! # Overview
//!
//! - [`SoundEngine`] - register/unregister sound banks, media and external sources
//! - [`DynamicDialogue`] - resolve a dialogue event's argument path to an audio node id
//! - [`EngineHandle`] / [`SoundEngineError`] - opaque results of those calls
//! - `MockSoundEngine` - recording implementation of both traits (requires `mock` feature)
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use resonar_cooked::MediaCookedData;
//! use resonar_test_utils::{LeafKind, MockSoundEngine, SoundEngine};
//!
//! let engine = MockSoundEngine::new();
//! let media = MediaCookedData::new(12, "Footstep_01");
//! let handle = engine.register_media(&media).unwrap();
//! assert_eq!(engine.register_count(LeafKind::Media, 12), 1);
//!
//! engine.unregister_media(&media, handle);
//! assert!(engine.is_idle());
//! # }
//! ```

pub mod engine_types;
#[cfg(feature = "mock")]
pub mod mock_engine;
pub mod sound_engine;

pub use engine_types::*;
#[cfg(feature = "mock")]
pub use mock_engine::*;
pub use sound_engine::*;
