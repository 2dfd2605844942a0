use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use resonar_core::alloc::HashMap;
use resonar_cooked::{
    AudioNodeLoading, DialogueEventCookedData, GroupValueCookedData,
    LocalizedDialogueEventCookedData, select_language,
};
use resonar_test_utils::{CandidateCallback, DynamicDialogue};

use super::{AudioNodeObject, build_argument_values};
use crate::error::{LoaderError, LoaderResult};
use crate::handle::DialogueEventPtr;
use crate::loader::ResourceLoader;
use crate::promise::{Completion, when_all};

/// A dialogue event and the audio nodes its resolutions produced.
///
/// Resolution asks the engine for an audio node id given a set of switch or
/// state arguments, then hands out the [`AudioNodeObject`] for that id,
/// creating and caching it on first use.
pub struct DialogueEvent {
    cooked: LocalizedDialogueEventCookedData,
    loader: ResourceLoader,
    engine: Arc<dyn DynamicDialogue>,
    loaded: Mutex<Option<DialogueEventPtr>>,
    local_nodes: Mutex<HashMap<u32, Arc<AudioNodeObject>>>,
}

impl DialogueEvent {
    pub fn new(
        cooked: LocalizedDialogueEventCookedData,
        loader: ResourceLoader,
        engine: Arc<dyn DynamicDialogue>,
    ) -> Self {
        Self {
            cooked,
            loader,
            engine,
            loaded: Mutex::new(None),
            local_nodes: Mutex::new(HashMap::new()),
        }
    }

    pub fn dialogue_event_id(&self) -> u32 {
        self.cooked.dialogue_event_id
    }

    pub fn cooked(&self) -> &LocalizedDialogueEventCookedData {
        &self.cooked
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.lock().as_ref().is_some_and(|node| node.is_loaded())
    }

    /// Load the event's own leaves, then every audio node marked
    /// [`AudioNodeLoading::AlwaysLoad`]. Blocks until done.
    ///
    /// Never call this from a loader worker thread.
    pub fn load_data(&self) -> bool {
        self.unload_data().wait();

        let Some(entry) = self.loader.create_list_entry(&self.cooked) else {
            tracing::warn!("Could not create an entry for {}", self.debug_name());
            return false;
        };
        let Some(node) = self.loader.load(entry).wait() else {
            tracing::warn!("Loading {} was cancelled", self.debug_name());
            return false;
        };
        let loaded = node.is_loaded();
        *self.loaded.lock() = Some(node);

        let always_load: Vec<u32> = self
            .current_cooked()
            .map(|cooked| {
                cooked
                    .audio_nodes
                    .values()
                    .filter(|node| node.audio_node_loading == AudioNodeLoading::AlwaysLoad)
                    .map(|node| node.audio_node_id)
                    .collect()
            })
            .unwrap_or_default();
        let pending: Vec<Completion<bool>> = always_load
            .into_iter()
            .filter_map(|id| self.fetch_audio_node_object(id))
            .filter(|object| !object.is_loaded())
            .map(|object| object.load_data())
            .collect();
        for completion in pending {
            completion.wait();
        }
        loaded
    }

    /// Unload the event and forget the audio node objects it handed out.
    ///
    /// An object is only unloaded here if this event is its last holder;
    /// objects shared with other events or callers stay as they are.
    pub fn unload_data(&self) -> Completion<()> {
        let local = std::mem::take(&mut *self.local_nodes.lock());
        let mut pending: Vec<Completion<()>> = local
            .into_values()
            .filter(|object| Arc::strong_count(object) == 1)
            .map(|object| object.unload_data().map(move |()| drop(object)))
            .collect();
        if let Some(node) = self.loaded.lock().take() {
            pending.push(self.loader.unload(node));
        }
        when_all(pending)
    }

    /// Resolve with unordered arguments.
    pub fn resolve_arguments(
        &self,
        arguments: &[&GroupValueCookedData],
    ) -> Option<Arc<AudioNodeObject>> {
        let arguments: Vec<_> = arguments.iter().copied().map(Some).collect();
        self.resolve(&arguments, false, None)
    }

    /// Resolve with one argument per declared position; `None` stands for
    /// "any".
    pub fn resolve_ordered_arguments(
        &self,
        arguments: &[Option<&GroupValueCookedData>],
    ) -> Option<Arc<AudioNodeObject>> {
        self.resolve(arguments, true, None)
    }

    /// Resolve to an audio node object, loading it if its policy says so.
    ///
    /// `candidate` can veto each path the engine considers. Failures are
    /// logged and yield `None`; see [`DialogueEvent::try_resolve`].
    pub fn resolve(
        &self,
        arguments: &[Option<&GroupValueCookedData>],
        ordered: bool,
        candidate: Option<&mut CandidateCallback<'_>>,
    ) -> Option<Arc<AudioNodeObject>> {
        match self.try_resolve(arguments, ordered, candidate) {
            Ok(object) => Some(object),
            Err(e) => {
                tracing::error!("{}: {}", self.debug_name(), e);
                None
            }
        }
    }

    pub fn try_resolve(
        &self,
        arguments: &[Option<&GroupValueCookedData>],
        ordered: bool,
        candidate: Option<&mut CandidateCallback<'_>>,
    ) -> LoaderResult<Arc<AudioNodeObject>> {
        if self.loaded.lock().is_none() {
            return Err(LoaderError::NotLoaded {
                name: self.debug_name(),
            });
        }

        let values = build_argument_values(&self.cooked.required_arguments, arguments, ordered)?;
        let mut accept_all = |_: u32, _: u32| true;
        let candidate: &mut CandidateCallback<'_> = match candidate {
            Some(candidate) => candidate,
            None => &mut accept_all,
        };

        let dialogue_event_id = self.cooked.dialogue_event_id;
        let audio_node_id = self
            .engine
            .resolve_dialogue_event(dialogue_event_id, &values, candidate);
        if audio_node_id == resonar_cooked::INVALID_ID {
            return Err(LoaderError::ResolveFailed { dialogue_event_id });
        }

        let object = self
            .fetch_audio_node_object(audio_node_id)
            .ok_or(LoaderError::UnknownAudioNode {
                dialogue_event_id,
                audio_node_id,
            })?;
        if object.loading_policy().loads_on_resolve() && !object.is_loaded() {
            let name = object.cooked().debug_string();
            object.load_data().then(move |loaded| {
                if !loaded {
                    tracing::warn!("Loading {} on resolve failed", name);
                }
            });
        }
        Ok(object)
    }

    /// Find or create the object for `audio_node_id`.
    ///
    /// Lookup order: the loader-wide cache, this event's cache, this event's
    /// id-0 template, then the cooked candidates.
    fn fetch_audio_node_object(&self, audio_node_id: u32) -> Option<Arc<AudioNodeObject>> {
        let known = self.loader.known_audio_nodes();
        if audio_node_id != resonar_cooked::INVALID_ID {
            if let Some(object) = known.get(audio_node_id) {
                self.local_nodes
                    .lock()
                    .entry(audio_node_id)
                    .or_insert_with(|| object.clone());
                return Some(object);
            }
        }

        let mut local = self.local_nodes.lock();
        if let Some(object) = local.get(&audio_node_id) {
            return Some(object.clone());
        }

        let cooked = match local.get(&resonar_cooked::INVALID_ID) {
            Some(template) => template.cooked().with_id(audio_node_id),
            None => {
                let dialogue = self.current_cooked()?;
                let Some(candidate) = dialogue.audio_nodes.values().find(|node| {
                    node.audio_node_id == resonar_cooked::INVALID_ID
                        || node.audio_node_id == audio_node_id
                }) else {
                    tracing::warn!(
                        "{}: no audio node candidate for {}",
                        self.debug_name(),
                        audio_node_id
                    );
                    return None;
                };
                candidate.with_id(audio_node_id)
            }
        };

        tracing::trace!("Creating audio node object {}", cooked.debug_string());
        let object = Arc::new(AudioNodeObject::new(cooked, self.loader.clone()));
        local.insert(audio_node_id, object.clone());
        if audio_node_id != resonar_cooked::INVALID_ID {
            known.insert(audio_node_id, &object);
        }
        Some(object)
    }

    /// The language variant currently loaded, or the configured one.
    fn current_cooked(&self) -> Option<&DialogueEventCookedData> {
        let language = match self.loaded.lock().as_ref() {
            Some(node) => node.language().clone(),
            None => self.loader.config().language.clone(),
        };
        select_language(&self.cooked.dialogue_event_language_map, &language)
            .map(|(_, cooked)| cooked)
    }

    fn debug_name(&self) -> String {
        format!(
            "DialogueEvent {} ({})",
            self.cooked.debug_name, self.cooked.dialogue_event_id
        )
    }
}

impl Drop for DialogueEvent {
    fn drop(&mut self) {
        if let Some(node) = self.loaded.get_mut().take() {
            let _ = self.loader.unload(node);
        }
    }
}

impl fmt::Debug for DialogueEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loaded = self.loaded.lock().is_some();
        let audio_nodes = self.local_nodes.lock().len();
        f.debug_struct("DialogueEvent")
            .field("dialogue_event", &self.debug_name())
            .field("loaded", &loaded)
            .field("audio_nodes", &audio_nodes)
            .finish()
    }
}
