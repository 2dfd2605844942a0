//! Traits abstracting the low-level audio engine.

use resonar_cooked::{ExternalSourceCookedData, MediaCookedData, SoundBankCookedData};

use crate::engine_types::{EngineHandle, SoundEngineResult};

/// Registration primitives for leaf resources.
///
/// Calls may block (file I/O, memory allocation); the loader only invokes
/// them from its worker pool. Each successful `register_*` is balanced by
/// exactly one `unregister_*` with the returned handle.
pub trait SoundEngine: Send + Sync {
    fn register_sound_bank(&self, sound_bank: &SoundBankCookedData) -> SoundEngineResult<EngineHandle>;

    fn unregister_sound_bank(&self, sound_bank: &SoundBankCookedData, handle: EngineHandle);

    fn register_media(&self, media: &MediaCookedData) -> SoundEngineResult<EngineHandle>;

    fn unregister_media(&self, media: &MediaCookedData, handle: EngineHandle);

    fn register_external_source(
        &self,
        external_source: &ExternalSourceCookedData,
    ) -> SoundEngineResult<EngineHandle>;

    fn unregister_external_source(
        &self,
        external_source: &ExternalSourceCookedData,
        handle: EngineHandle,
    );
}

/// Candidate filter passed to [`DynamicDialogue::resolve_dialogue_event`].
///
/// Receives `(dialogue_event_id, audio_node_id)` for each candidate the
/// engine considers and returns whether to accept it.
pub type CandidateCallback<'a> = dyn FnMut(u32, u32) -> bool + 'a;

/// Dialogue path resolution provided by the engine.
pub trait DynamicDialogue: Send + Sync {
    /// Walk the dialogue event's decision tree with `argument_values`, where
    /// `0` selects the fallback branch. Returns the chosen audio node id, or
    /// `0` when nothing matched.
    fn resolve_dialogue_event(
        &self,
        dialogue_event_id: u32,
        argument_values: &[u32],
        candidate: &mut CandidateCallback<'_>,
    ) -> u32;
}
