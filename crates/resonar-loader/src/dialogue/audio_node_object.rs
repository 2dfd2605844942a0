use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use resonar_cooked::{AudioNodeCookedData, AudioNodeLoading};

use crate::handle::AudioNodePtr;
use crate::loaded::LeafIds;
use crate::loader::ResourceLoader;
use crate::promise::{self, Completion, Promise};

enum ObjectState {
    Unloaded,
    Loading {
        waiters: Vec<Promise<bool>>,
        /// Unloads requested mid-load; the node is unloaded as soon as it
        /// arrives.
        unload_waiters: Vec<Promise<()>>,
    },
    Loaded(AudioNodePtr),
}

enum LoadAction {
    Ready(Promise<bool>, bool),
    Queued,
    Start,
}

/// An audio node handed out by dialogue resolution.
///
/// Owns at most one loaded [`AudioNodePtr`]. Dropping the object unloads
/// whatever it still holds.
pub struct AudioNodeObject {
    cooked: AudioNodeCookedData,
    loader: ResourceLoader,
    state: Mutex<ObjectState>,
}

impl AudioNodeObject {
    pub fn new(cooked: AudioNodeCookedData, loader: ResourceLoader) -> Self {
        Self {
            cooked,
            loader,
            state: Mutex::new(ObjectState::Unloaded),
        }
    }

    pub fn audio_node_id(&self) -> u32 {
        self.cooked.audio_node_id
    }

    pub fn cooked(&self) -> &AudioNodeCookedData {
        &self.cooked
    }

    pub fn loading_policy(&self) -> AudioNodeLoading {
        self.cooked.audio_node_loading
    }

    /// Load the node's leaves. Resolves to whether the node ended up loaded.
    pub fn load_data(self: &Arc<Self>) -> Completion<bool> {
        let (promise, completion) = promise::channel();
        let action = {
            let mut state = self.state.lock();
            match &mut *state {
                ObjectState::Loaded(node) => LoadAction::Ready(promise, node.is_loaded()),
                ObjectState::Loading { waiters, .. } => {
                    waiters.push(promise);
                    LoadAction::Queued
                }
                ObjectState::Unloaded => {
                    *state = ObjectState::Loading {
                        waiters: vec![promise],
                        unload_waiters: Vec::new(),
                    };
                    LoadAction::Start
                }
            }
        };

        match action {
            LoadAction::Ready(promise, loaded) => promise.fulfill(loaded),
            LoadAction::Queued => {}
            LoadAction::Start => {
                let Some(entry) = self.loader.create_list_entry(&self.cooked) else {
                    self.finish_load(None);
                    return completion;
                };
                tracing::debug!("Loading audio node object {}", self.cooked.debug_string());
                let object = Arc::downgrade(self);
                let loader = self.loader.clone();
                self.loader.load(entry).then(move |node| match object.upgrade() {
                    Some(object) => object.finish_load(node),
                    None => {
                        if let Some(node) = node {
                            let _ = loader.unload(node);
                        }
                    }
                });
            }
        }
        completion
    }

    fn finish_load(&self, node: Option<AudioNodePtr>) {
        let mut state = self.state.lock();
        let (waiters, unload_waiters) =
            match std::mem::replace(&mut *state, ObjectState::Unloaded) {
                ObjectState::Loading {
                    waiters,
                    unload_waiters,
                } => (waiters, unload_waiters),
                other => {
                    *state = other;
                    drop(state);
                    tracing::error!(
                        "{}: load finished while not loading",
                        self.cooked.debug_string()
                    );
                    if let Some(node) = node {
                        let _ = self.loader.unload(node);
                    }
                    return;
                }
            };

        match node {
            Some(node) if unload_waiters.is_empty() => {
                let loaded = node.is_loaded();
                *state = ObjectState::Loaded(node);
                drop(state);
                for waiter in waiters {
                    waiter.fulfill(loaded);
                }
            }
            Some(node) => {
                drop(state);
                for waiter in waiters {
                    waiter.fulfill(false);
                }
                self.loader.unload(node).then(move |()| {
                    for waiter in unload_waiters {
                        waiter.fulfill(());
                    }
                });
            }
            None => {
                drop(state);
                for waiter in waiters {
                    waiter.fulfill(false);
                }
                for waiter in unload_waiters {
                    waiter.fulfill(());
                }
            }
        }
    }

    /// Release the node's leaves. A load in flight is unloaded once it lands.
    pub fn unload_data(&self) -> Completion<()> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, ObjectState::Unloaded) {
            ObjectState::Loaded(node) => {
                drop(state);
                self.loader.unload(node)
            }
            ObjectState::Loading {
                waiters,
                mut unload_waiters,
            } => {
                let (promise, completion) = promise::channel();
                unload_waiters.push(promise);
                *state = ObjectState::Loading {
                    waiters,
                    unload_waiters,
                };
                completion
            }
            ObjectState::Unloaded => Completion::ready(()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(&*self.state.lock(), ObjectState::Loaded(node) if node.is_loaded())
    }

    pub fn is_fully_loaded(&self) -> bool {
        matches!(&*self.state.lock(), ObjectState::Loaded(node) if node.is_fully_loaded())
    }

    pub fn is_loading(&self) -> bool {
        matches!(&*self.state.lock(), ObjectState::Loading { .. })
    }

    /// Leaves held, for posting.
    pub fn leaf_ids(&self) -> Option<LeafIds> {
        match &*self.state.lock() {
            ObjectState::Loaded(node) => Some(node.leaf_ids()),
            _ => None,
        }
    }
}

impl Drop for AudioNodeObject {
    fn drop(&mut self) {
        let state = std::mem::replace(self.state.get_mut(), ObjectState::Unloaded);
        if let ObjectState::Loaded(node) = state {
            let _ = self.loader.unload(node);
        }
    }
}

impl fmt::Debug for AudioNodeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.lock() {
            ObjectState::Unloaded => "unloaded",
            ObjectState::Loading { .. } => "loading",
            ObjectState::Loaded(_) => "loaded",
        };
        f.debug_struct("AudioNodeObject")
            .field("audio_node", &self.cooked.debug_string())
            .field("state", &state)
            .finish()
    }
}
