//! Reference-counted pools of leaf resources.
//!
//! One manager per leaf kind. Each owns an identity -> state table, folds
//! concurrent loads of one identity into a single engine registration, and
//! unregisters only when the last holder unloads.

mod pool;

use std::fmt;
use std::hash::Hash;

use resonar_cooked::{ExternalSourceCookedData, MediaCookedData, SoundBankCookedData};
use resonar_test_utils::{EngineHandle, LeafKind, SoundEngine, SoundEngineResult};

use crate::promise::Completion;

pub use pool::{PoolStats, ResourcePool};

/// A leaf descriptor the sound engine can register.
pub trait LeafResource: Clone + fmt::Debug + Send + Sync + 'static {
    /// Deduplication key.
    type Key: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    const KIND: LeafKind;

    fn key(&self) -> Self::Key;

    /// Numeric id handed to the event-posting layer.
    fn leaf_id(&self) -> u32;

    fn register(&self, engine: &dyn SoundEngine) -> SoundEngineResult<EngineHandle>;

    fn unregister(&self, engine: &dyn SoundEngine, handle: EngineHandle);
}

impl LeafResource for SoundBankCookedData {
    type Key = (u32, u32);
    const KIND: LeafKind = LeafKind::SoundBank;

    fn key(&self) -> Self::Key {
        (self.sound_bank_id, self.language_id)
    }

    fn leaf_id(&self) -> u32 {
        self.sound_bank_id
    }

    fn register(&self, engine: &dyn SoundEngine) -> SoundEngineResult<EngineHandle> {
        engine.register_sound_bank(self)
    }

    fn unregister(&self, engine: &dyn SoundEngine, handle: EngineHandle) {
        engine.unregister_sound_bank(self, handle)
    }
}

impl LeafResource for MediaCookedData {
    type Key = u32;
    const KIND: LeafKind = LeafKind::Media;

    fn key(&self) -> Self::Key {
        self.media_id
    }

    fn leaf_id(&self) -> u32 {
        self.media_id
    }

    fn register(&self, engine: &dyn SoundEngine) -> SoundEngineResult<EngineHandle> {
        engine.register_media(self)
    }

    fn unregister(&self, engine: &dyn SoundEngine, handle: EngineHandle) {
        engine.unregister_media(self, handle)
    }
}

impl LeafResource for ExternalSourceCookedData {
    type Key = u32;
    const KIND: LeafKind = LeafKind::ExternalSource;

    fn key(&self) -> Self::Key {
        self.cookie
    }

    fn leaf_id(&self) -> u32 {
        self.cookie
    }

    fn register(&self, engine: &dyn SoundEngine) -> SoundEngineResult<EngineHandle> {
        engine.register_external_source(self)
    }

    fn unregister(&self, engine: &dyn SoundEngine, handle: EngineHandle) {
        engine.unregister_external_source(self, handle)
    }
}

/// Proof of one successful load. Unloading consumes it, so every load is
/// released at most once.
pub struct ResourceHandle<R: LeafResource> {
    cooked: R,
    engine_handle: EngineHandle,
}

impl<R: LeafResource> ResourceHandle<R> {
    pub(crate) fn new(cooked: R, engine_handle: EngineHandle) -> Self {
        Self {
            cooked,
            engine_handle,
        }
    }

    pub fn cooked(&self) -> &R {
        &self.cooked
    }

    pub fn key(&self) -> R::Key {
        self.cooked.key()
    }

    pub fn leaf_id(&self) -> u32 {
        self.cooked.leaf_id()
    }

    pub fn engine_handle(&self) -> EngineHandle {
        self.engine_handle
    }
}

impl<R: LeafResource> fmt::Debug for ResourceHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("kind", &R::KIND)
            .field("key", &self.cooked.key())
            .field("engine_handle", &self.engine_handle)
            .finish()
    }
}

/// Async load/unload of one leaf kind.
pub trait ResourceManager<R: LeafResource>: Send + Sync {
    /// Resolves to `None` if the engine refused the resource.
    fn load(&self, cooked: &R) -> Completion<Option<ResourceHandle<R>>>;

    fn unload(&self, handle: ResourceHandle<R>) -> Completion<()>;

    /// No identity is loading, loaded or unloading.
    fn is_empty(&self) -> bool;
}

pub type SoundBankManager = ResourcePool<SoundBankCookedData>;
pub type MediaManager = ResourcePool<MediaCookedData>;
pub type ExternalSourceManager = ResourcePool<ExternalSourceCookedData>;
