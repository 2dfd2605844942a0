//! Mock implementation of SoundEngine and DynamicDialogue for testing.
//!
//! Records every registration without touching a real audio engine, and
//! flags the two mistakes a loader can make against an engine: registering
//! an identity that is already live, and unregistering one that is not.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use resonar_cooked::{ExternalSourceCookedData, MediaCookedData, SoundBankCookedData};

use crate::engine_types::{EngineHandle, LeafKind, SoundEngineError, SoundEngineResult};
use crate::sound_engine::{CandidateCallback, DynamicDialogue, SoundEngine};

/// Records an engine call for verification in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    Register { kind: LeafKind, id: u32 },
    Unregister { kind: LeafKind, id: u32 },
}

#[derive(Default)]
struct Registry {
    live: HashMap<(LeafKind, u32), EngineHandle>,
    register_counts: HashMap<(LeafKind, u32), usize>,
    total_registrations: usize,
    total_unregistrations: usize,
    double_registrations: usize,
    invalid_unregistrations: usize,
}

struct ScriptedPath {
    dialogue_event_id: u32,
    path: Vec<u32>,
    audio_node_id: u32,
}

/// Mock sound engine for testing.
///
/// Leaf identities are `(kind, id)`; sound banks use their bank id, media
/// their media id and external sources their cookie.
///
/// # Example
///
/// ```rust
/// use resonar_cooked::SoundBankCookedData;
/// use resonar_test_utils::{LeafKind, MockSoundEngine, SoundEngine};
///
/// let engine = MockSoundEngine::new();
/// engine.fail_on(LeafKind::SoundBank, 3);
///
/// let bank = SoundBankCookedData::new(3, "Missing");
/// assert!(engine.register_sound_bank(&bank).is_err());
/// assert_eq!(engine.live_count(), 0);
/// ```
pub struct MockSoundEngine {
    registry: Mutex<Registry>,

    /// Recorded calls, only kept while `record_calls` is on
    calls: Mutex<Option<Vec<EngineCall>>>,

    failures: Mutex<HashSet<(LeafKind, u32)>>,
    media_delay: Mutex<Option<Duration>>,
    next_handle: AtomicU64,

    dialogue_paths: Mutex<Vec<ScriptedPath>>,
    dialogue_calls: Mutex<Vec<(u32, Vec<u32>)>>,
}

impl MockSoundEngine {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            calls: Mutex::new(None),
            failures: Mutex::new(HashSet::new()),
            media_delay: Mutex::new(None),
            next_handle: AtomicU64::new(1),
            dialogue_paths: Mutex::new(Vec::new()),
            dialogue_calls: Mutex::new(Vec::new()),
        }
    }

    /// Start keeping an ordered call log.
    pub fn record_calls(&self) {
        self.calls.lock().get_or_insert_with(Vec::new);
    }

    /// Get a copy of all recorded calls (empty unless `record_calls` was called).
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone().unwrap_or_default()
    }

    /// Make every registration of `(kind, id)` fail.
    pub fn fail_on(&self, kind: LeafKind, id: u32) {
        self.failures.lock().insert((kind, id));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// Sleep inside every media registration, to widen race windows.
    pub fn set_media_delay(&self, delay: Option<Duration>) {
        *self.media_delay.lock() = delay;
    }

    /// Number of successful registrations of one identity so far.
    pub fn register_count(&self, kind: LeafKind, id: u32) -> usize {
        self.registry
            .lock()
            .register_counts
            .get(&(kind, id))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_registrations(&self) -> usize {
        self.registry.lock().total_registrations
    }

    pub fn total_unregistrations(&self) -> usize {
        self.registry.lock().total_unregistrations
    }

    pub fn is_live(&self, kind: LeafKind, id: u32) -> bool {
        self.registry.lock().live.contains_key(&(kind, id))
    }

    pub fn live_count(&self) -> usize {
        self.registry.lock().live.len()
    }

    /// Registrations of an identity that was already live.
    pub fn double_registrations(&self) -> usize {
        self.registry.lock().double_registrations
    }

    /// Unregistrations of an identity that was not live, or with a stale handle.
    pub fn invalid_unregistrations(&self) -> usize {
        self.registry.lock().invalid_unregistrations
    }

    /// Nothing live and no protocol violation recorded.
    pub fn is_idle(&self) -> bool {
        let registry = self.registry.lock();
        registry.live.is_empty()
            && registry.double_registrations == 0
            && registry.invalid_unregistrations == 0
    }

    /// Teach the dialogue resolver one path. A `0` in `path` is the fallback
    /// branch and matches any supplied value.
    pub fn script_dialogue(&self, dialogue_event_id: u32, path: &[u32], audio_node_id: u32) {
        self.dialogue_paths.lock().push(ScriptedPath {
            dialogue_event_id,
            path: path.to_vec(),
            audio_node_id,
        });
    }

    /// Argument vectors passed to `resolve_dialogue_event`, in call order.
    pub fn dialogue_calls(&self) -> Vec<(u32, Vec<u32>)> {
        self.dialogue_calls.lock().clone()
    }

    fn record(&self, call: EngineCall) {
        if let Some(calls) = self.calls.lock().as_mut() {
            calls.push(call);
        }
    }

    fn register(&self, kind: LeafKind, id: u32) -> SoundEngineResult<EngineHandle> {
        if kind == LeafKind::Media {
            let delay = *self.media_delay.lock();
            if let Some(delay) = delay {
                thread::sleep(delay);
            }
        }
        if self.failures.lock().contains(&(kind, id)) {
            tracing::trace!("mock engine failing {} {}", kind, id);
            return Err(SoundEngineError::Rejected {
                kind,
                id,
                reason: "scripted failure".to_string(),
            });
        }

        let handle = EngineHandle::from_raw(self.next_handle.fetch_add(1, Ordering::Relaxed));
        {
            let mut registry = self.registry.lock();
            if registry.live.insert((kind, id), handle).is_some() {
                tracing::error!("mock engine: {} {} registered twice", kind, id);
                registry.double_registrations += 1;
            }
            *registry.register_counts.entry((kind, id)).or_default() += 1;
            registry.total_registrations += 1;
        }
        self.record(EngineCall::Register { kind, id });
        Ok(handle)
    }

    fn unregister(&self, kind: LeafKind, id: u32, handle: EngineHandle) {
        {
            let mut registry = self.registry.lock();
            match registry.live.remove(&(kind, id)) {
                Some(live) if live == handle => {}
                Some(live) => {
                    tracing::error!("mock engine: {} {} unregistered with a stale handle", kind, id);
                    registry.live.insert((kind, id), live);
                    registry.invalid_unregistrations += 1;
                }
                None => {
                    tracing::error!("mock engine: {} {} unregistered while not live", kind, id);
                    registry.invalid_unregistrations += 1;
                }
            }
            registry.total_unregistrations += 1;
        }
        self.record(EngineCall::Unregister { kind, id });
    }
}

impl Default for MockSoundEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundEngine for MockSoundEngine {
    fn register_sound_bank(&self, sound_bank: &SoundBankCookedData) -> SoundEngineResult<EngineHandle> {
        self.register(LeafKind::SoundBank, sound_bank.sound_bank_id)
    }

    fn unregister_sound_bank(&self, sound_bank: &SoundBankCookedData, handle: EngineHandle) {
        self.unregister(LeafKind::SoundBank, sound_bank.sound_bank_id, handle)
    }

    fn register_media(&self, media: &MediaCookedData) -> SoundEngineResult<EngineHandle> {
        self.register(LeafKind::Media, media.media_id)
    }

    fn unregister_media(&self, media: &MediaCookedData, handle: EngineHandle) {
        self.unregister(LeafKind::Media, media.media_id, handle)
    }

    fn register_external_source(
        &self,
        external_source: &ExternalSourceCookedData,
    ) -> SoundEngineResult<EngineHandle> {
        self.register(LeafKind::ExternalSource, external_source.cookie)
    }

    fn unregister_external_source(
        &self,
        external_source: &ExternalSourceCookedData,
        handle: EngineHandle,
    ) {
        self.unregister(LeafKind::ExternalSource, external_source.cookie, handle)
    }
}

impl DynamicDialogue for MockSoundEngine {
    fn resolve_dialogue_event(
        &self,
        dialogue_event_id: u32,
        argument_values: &[u32],
        candidate: &mut CandidateCallback<'_>,
    ) -> u32 {
        self.dialogue_calls
            .lock()
            .push((dialogue_event_id, argument_values.to_vec()));

        let candidates: Vec<u32> = {
            let paths = self.dialogue_paths.lock();
            let matching = |exact: bool| {
                paths
                    .iter()
                    .filter(|p| p.dialogue_event_id == dialogue_event_id)
                    .filter(|p| p.path.len() == argument_values.len())
                    .filter(|p| {
                        p.path.iter().zip(argument_values).all(|(want, got)| {
                            want == got || (!exact && *want == 0)
                        })
                    })
                    .map(|p| p.audio_node_id)
                    .collect::<Vec<_>>()
            };
            let mut candidates = matching(true);
            candidates.extend(matching(false));
            candidates
        };

        candidates
            .into_iter()
            .find(|audio_node_id| candidate(dialogue_event_id, *audio_node_id))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_unregister() {
        let engine = MockSoundEngine::new();
        let bank = SoundBankCookedData::new(1, "Init");

        let handle = engine.register_sound_bank(&bank).unwrap();
        assert!(engine.is_live(LeafKind::SoundBank, 1));
        assert_eq!(engine.total_registrations(), 1);

        engine.unregister_sound_bank(&bank, handle);
        assert!(engine.is_idle());
        assert_eq!(engine.total_unregistrations(), 1);
    }

    #[test]
    fn test_detects_double_registration() {
        let engine = MockSoundEngine::new();
        let media = MediaCookedData::new(5, "");
        let _ = engine.register_media(&media).unwrap();
        let _ = engine.register_media(&media).unwrap();
        assert_eq!(engine.double_registrations(), 1);
        assert!(!engine.is_idle());
    }

    #[test]
    fn test_detects_invalid_unregistration() {
        let engine = MockSoundEngine::new();
        let source = ExternalSourceCookedData::new(8, "");
        engine.unregister_external_source(&source, EngineHandle::from_raw(99));
        assert_eq!(engine.invalid_unregistrations(), 1);
    }

    #[test]
    fn test_call_log_is_opt_in() {
        let engine = MockSoundEngine::new();
        let media = MediaCookedData::new(5, "");
        let handle = engine.register_media(&media).unwrap();
        assert!(engine.calls().is_empty());

        engine.record_calls();
        engine.unregister_media(&media, handle);
        assert_eq!(
            engine.calls(),
            vec![EngineCall::Unregister {
                kind: LeafKind::Media,
                id: 5
            }]
        );
    }

    #[test]
    fn test_dialogue_prefers_exact_path() {
        let engine = MockSoundEngine::new();
        engine.script_dialogue(10, &[0, 7], 100);
        engine.script_dialogue(10, &[3, 7], 200);

        let mut accept_all = |_: u32, _: u32| true;
        assert_eq!(engine.resolve_dialogue_event(10, &[3, 7], &mut accept_all), 200);
        assert_eq!(engine.resolve_dialogue_event(10, &[4, 7], &mut accept_all), 100);
        assert_eq!(engine.resolve_dialogue_event(10, &[4, 8], &mut accept_all), 0);
        assert_eq!(engine.dialogue_calls().len(), 3);
    }

    #[test]
    fn test_dialogue_candidate_callback_can_reject() {
        let engine = MockSoundEngine::new();
        engine.script_dialogue(10, &[3], 200);
        engine.script_dialogue(10, &[0], 100);

        let mut reject_200 = |_: u32, node: u32| node != 200;
        assert_eq!(engine.resolve_dialogue_event(10, &[3], &mut reject_200), 100);
    }
}
