//! The resource loader: node graph orchestration on top of the leaf managers.
//!
//! Loads and unloads run as tasks on a [`TaskPool`]. Each task walks one
//! node's dependencies in a fixed order and suspends on the completions of
//! the managers, so no worker thread ever blocks on another.
//!
//! Load order for one node:
//! 1. take a reference on the node's own group value, if any
//! 2. load the required group values as child nodes
//! 3. load sound banks, then media and external sources together
//! 4. attach the conditional audio nodes and reconcile them
//!
//! Unloading walks the same steps backwards.

use std::sync::Arc;

use resonar_core::TaskPool;
use resonar_core::profiling::profile_function;
use resonar_cooked::{
    AudioNodeCookedData, ExternalSourceCookedData, GroupValueCookedData, InitBankCookedData,
    LanguageCookedData, LocalizedAuxBusCookedData, LocalizedDialogueEventCookedData,
    LocalizedEventCookedData, LocalizedShareSetCookedData, LocalizedSoundBankCookedData,
    MediaCookedData, SoundBankCookedData,
};
use resonar_test_utils::SoundEngine;

use crate::config::LoaderConfig;
use crate::dialogue::KnownAudioNodes;
use crate::error::{LoaderError, LoaderResult};
use crate::event::{EventBuffer, LoaderEvent};
use crate::handle::{GroupValuePtr, NodeKind, NodePtr, NodeType, kind};
use crate::loaded::{
    CookedSource, GroupValueRegistry, LeafSet, LoadedAudioNode, LoadedLeaves, LoadedNode,
};
use crate::managers::{LeafResource, ResourceHandle, ResourceManager, ResourcePool};
use crate::promise::{self, Completion, Promise, join_all};
use crate::state::NodeState;
use crate::storage::NodeStorage;

type PendingLeaf<R> = (u32, Completion<Option<ResourceHandle<R>>>);

pub(crate) struct LoaderInner {
    config: LoaderConfig,
    tasks: Arc<TaskPool>,
    sound_banks: Arc<dyn ResourceManager<SoundBankCookedData>>,
    media: Arc<dyn ResourceManager<MediaCookedData>>,
    external_sources: Arc<dyn ResourceManager<ExternalSourceCookedData>>,
    storage: NodeStorage,
    group_values: GroupValueRegistry,
    known_audio_nodes: KnownAudioNodes,
    events: EventBuffer,
}

/// Asynchronous, reference-counted loader for cooked audio assets.
///
/// Cheap to clone; every clone drives the same node storage, managers and
/// worker pool.
///
/// # Example
///
/// ```ignore
/// let loader = ResourceLoader::new(LoaderConfig::default(), engine)?;
/// let entry = loader.create_list_entry(&cooked_event).unwrap();
/// let event = loader.load(entry).wait().unwrap();
/// assert!(event.is_loaded());
/// loader.unload(event).wait();
/// ```
#[derive(Clone)]
pub struct ResourceLoader {
    inner: Arc<LoaderInner>,
}

impl ResourceLoader {
    /// Create a loader with [`ResourcePool`] managers over `engine`.
    pub fn new(config: LoaderConfig, engine: Arc<dyn SoundEngine>) -> LoaderResult<Self> {
        config.runtime.apply();
        let tasks = Arc::new(TaskPool::from_config(&config.runtime)?);
        tracing::info!(
            "Starting resource loader with {} worker threads",
            tasks.thread_count()
        );
        let sound_banks = Arc::new(ResourcePool::<SoundBankCookedData>::new(
            engine.clone(),
            tasks.clone(),
        ));
        let media = Arc::new(ResourcePool::<MediaCookedData>::new(
            engine.clone(),
            tasks.clone(),
        ));
        let external_sources = Arc::new(ResourcePool::<ExternalSourceCookedData>::new(
            engine,
            tasks.clone(),
        ));
        Ok(Self::with_managers(
            config,
            tasks,
            sound_banks,
            media,
            external_sources,
        ))
    }

    /// Create a loader over caller-provided managers.
    pub fn with_managers(
        config: LoaderConfig,
        tasks: Arc<TaskPool>,
        sound_banks: Arc<dyn ResourceManager<SoundBankCookedData>>,
        media: Arc<dyn ResourceManager<MediaCookedData>>,
        external_sources: Arc<dyn ResourceManager<ExternalSourceCookedData>>,
    ) -> Self {
        let known_audio_nodes = KnownAudioNodes::new();
        known_audio_nodes.init();
        Self {
            inner: Arc::new(LoaderInner {
                events: EventBuffer::new(config.record_events),
                config,
                tasks,
                sound_banks,
                media,
                external_sources,
                storage: NodeStorage::new(),
                group_values: GroupValueRegistry::new(),
                known_audio_nodes,
            }),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    /// Process-wide cache of audio node objects created by dialogue
    /// resolution.
    pub fn known_audio_nodes(&self) -> &KnownAudioNodes {
        &self.inner.known_audio_nodes
    }

    /// Create an unloaded node for `cooked` in the configured language.
    ///
    /// Returns `None` if the language is unavailable, or if the descriptor
    /// is empty and [`LoaderConfig::reject_empty_nodes`] is set.
    pub fn create_list_entry<C: CookedSource>(&self, cooked: &C) -> Option<NodePtr<C::Kind>> {
        self.inner.create_entry(cooked, &self.inner.config.language)
    }

    pub fn create_list_entry_for_language<C: CookedSource>(
        &self,
        cooked: &C,
        language: &LanguageCookedData,
    ) -> Option<NodePtr<C::Kind>> {
        self.inner.create_entry(cooked, language)
    }

    /// Start loading `node`. `promise` receives the node back once every
    /// dependency has completed, whether or not each succeeded.
    ///
    /// The promise resolves to `None` only if the loader shut down first.
    pub fn load_node<K: NodeType>(&self, promise: Promise<Option<NodePtr<K>>>, node: NodePtr<K>) {
        profile_function!();
        self.inner.spawn_load(promise, node);
    }

    /// Start unloading `node`. Dependencies whose last holder this was are
    /// released in turn; the node itself is freed once done.
    pub fn unload_node<K: NodeType>(&self, promise: Promise<()>, node: NodePtr<K>) {
        profile_function!();
        self.inner.spawn_unload(promise, node);
    }

    pub fn load<K: NodeType>(&self, node: NodePtr<K>) -> Completion<Option<NodePtr<K>>> {
        let (promise, completion) = promise::channel();
        self.load_node(promise, node);
        completion
    }

    pub fn unload<K: NodeType>(&self, node: NodePtr<K>) -> Completion<()> {
        let (promise, completion) = promise::channel();
        self.unload_node(promise, node);
        completion
    }

    /// Create and load in one step.
    pub fn load_cooked<C: CookedSource>(&self, cooked: &C) -> Completion<Option<NodePtr<C::Kind>>> {
        match self.create_list_entry(cooked) {
            Some(node) => self.load(node),
            None => Completion::ready(None),
        }
    }

    /// Number of `kind` nodes in storage, loaded or not.
    pub fn node_count(&self, kind: NodeKind) -> usize {
        self.inner.storage.len(kind)
    }

    /// How many nodes currently hold `value`.
    pub fn group_value_holders(&self, value: &GroupValueCookedData) -> usize {
        self.inner.group_values.holders(value)
    }

    /// No node, group value or leaf is tracked anywhere.
    pub fn is_empty(&self) -> bool {
        self.inner.storage.is_empty()
            && self.inner.group_values.is_empty()
            && self.inner.sound_banks.is_empty()
            && self.inner.media.is_empty()
            && self.inner.external_sources.is_empty()
    }

    /// Take the events recorded since the last call.
    pub fn drain_events(&self) -> Vec<LoaderEvent> {
        self.inner.events.drain()
    }

    /// Stop the worker pool. Loads issued afterwards resolve to `None`.
    pub fn shutdown(&self) {
        self.inner.known_audio_nodes.shutdown();
        self.inner.tasks.shutdown();
        let leaked = self.inner.storage.describe();
        if !leaked.is_empty() {
            tracing::warn!(
                "Resource loader shut down with {} nodes still in storage: {:?}",
                leaked.len(),
                leaked
            );
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.tasks.is_shutdown()
    }
}

macro_rules! node_operations {
    ($($kind:ident: $cooked:ty => $create:ident, $load:ident, $unload:ident;)*) => {
        /// Per-kind entry points.
        impl ResourceLoader {
            $(
                pub fn $create(&self, cooked: &$cooked) -> Option<NodePtr<kind::$kind>> {
                    self.create_list_entry(cooked)
                }

                pub fn $load(
                    &self,
                    promise: Promise<Option<NodePtr<kind::$kind>>>,
                    node: NodePtr<kind::$kind>,
                ) {
                    self.load_node(promise, node)
                }

                pub fn $unload(&self, promise: Promise<()>, node: NodePtr<kind::$kind>) {
                    self.unload_node(promise, node)
                }
            )*
        }
    };
}

node_operations! {
    AudioNode: AudioNodeCookedData =>
        create_audio_node_list_entry, load_audio_node, unload_audio_node;
    AuxBus: LocalizedAuxBusCookedData =>
        create_aux_bus_list_entry, load_aux_bus, unload_aux_bus;
    DialogueEvent: LocalizedDialogueEventCookedData =>
        create_dialogue_event_list_entry, load_dialogue_event, unload_dialogue_event;
    Event: LocalizedEventCookedData =>
        create_event_list_entry, load_event, unload_event;
    ExternalSource: ExternalSourceCookedData =>
        create_external_source_list_entry, load_external_source, unload_external_source;
    GroupValue: GroupValueCookedData =>
        create_group_value_list_entry, load_group_value, unload_group_value;
    InitBank: InitBankCookedData =>
        create_init_bank_list_entry, load_init_bank, unload_init_bank;
    Media: MediaCookedData =>
        create_media_list_entry, load_media, unload_media;
    ShareSet: LocalizedShareSetCookedData =>
        create_share_set_list_entry, load_share_set, unload_share_set;
    SoundBank: LocalizedSoundBankCookedData =>
        create_sound_bank_list_entry, load_sound_bank, unload_sound_bank;
}

enum ReconcileStep {
    Load,
    Unload(LoadedLeaves),
    /// Settled; the waiters to wake.
    Idle(Vec<Promise<()>>),
}

/// Owns a branch's `processing` flag. Dropping it unfinished (the task was
/// torn down) still releases the flag and wakes the waiters.
struct ReconcileGuard {
    node: Arc<LoadedAudioNode>,
    done: bool,
}

impl ReconcileGuard {
    fn finish(mut self, waiters: Vec<Promise<()>>) {
        self.done = true;
        for waiter in waiters {
            waiter.fulfill(());
        }
    }
}

impl Drop for ReconcileGuard {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let waiters = {
            let mut state = self.node.state.lock();
            state.processing = false;
            std::mem::take(&mut state.idle_waiters)
        };
        for waiter in waiters {
            waiter.fulfill(());
        }
    }
}

impl LoaderInner {
    fn create_entry<C: CookedSource>(
        &self,
        cooked: &C,
        language: &LanguageCookedData,
    ) -> Option<NodePtr<C::Kind>> {
        profile_function!();
        let kind = <C::Kind as NodeType>::KIND;
        let descriptor = match cooked.describe(language) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                tracing::warn!("Could not create {} entry: {}", kind, e);
                return None;
            }
        };
        if self.config.reject_empty_nodes && !descriptor.has_dependencies() {
            let e = LoaderError::EmptyDescriptor {
                name: descriptor.debug_string,
            };
            tracing::warn!("Could not create {} entry: {}", kind, e);
            return None;
        }

        let node = Arc::new(LoadedNode::new(kind, descriptor));
        let slot = self.storage.insert(node.clone());
        tracing::trace!("Created {} entry {:?}", kind, slot);
        Some(NodePtr::new(slot, node))
    }

    fn spawn_load<K: NodeType>(
        self: &Arc<Self>,
        promise: Promise<Option<NodePtr<K>>>,
        node: NodePtr<K>,
    ) {
        let inner = self.clone();
        self.tasks.spawn_detached(async move {
            let node = inner.load_task(node).await;
            promise.fulfill(node);
        });
    }

    fn spawn_unload<K: NodeType>(self: &Arc<Self>, promise: Promise<()>, node: NodePtr<K>) {
        let inner = self.clone();
        self.tasks.spawn_detached(async move {
            inner.unload_task(node).await;
            promise.fulfill(());
        });
    }

    fn load_child(self: &Arc<Self>, child: GroupValuePtr) -> Completion<Option<GroupValuePtr>> {
        let (promise, completion) = promise::channel();
        self.spawn_load(promise, child);
        completion
    }

    fn unload_child(self: &Arc<Self>, child: GroupValuePtr) -> Completion<()> {
        let (promise, completion) = promise::channel();
        self.spawn_unload(promise, child);
        completion
    }

    async fn load_task<K: NodeType>(self: Arc<Self>, node: NodePtr<K>) -> Option<NodePtr<K>> {
        let loaded = node.node().clone();
        match loaded.state() {
            NodeState::Unloaded => {}
            NodeState::Loaded => {
                tracing::trace!("{} already loaded", loaded.descriptor.debug_string);
                return Some(node);
            }
            state => {
                tracing::error!(
                    "{}: load requested while {:?}",
                    loaded.descriptor.debug_string,
                    state
                );
                return Some(node);
            }
        }
        loaded.advance(NodeState::Loading);
        let descriptor = &loaded.descriptor;
        tracing::debug!("Loading {}", descriptor.debug_string);

        if let Some(value) = &descriptor.group_value {
            let affected = self.group_values.load(value);
            loaded.data.lock().group_value_held = true;
            self.reconcile_all(affected).await;
        }

        if !descriptor.required_group_values.is_empty() {
            let pending: Vec<_> = descriptor
                .required_group_values
                .iter()
                .filter_map(|value| self.create_entry(value, &descriptor.language))
                .map(|child| self.load_child(child))
                .collect();
            let children = join_all(pending).await.into_iter().flatten().collect();
            loaded.data.lock().children = children;
        }

        let leaves = self.load_leaves(&descriptor.leaves).await;
        loaded.data.lock().leaves = leaves;

        if !descriptor.audio_nodes.is_empty() {
            let audio_nodes: Vec<_> = descriptor
                .audio_nodes
                .iter()
                .map(|(condition, audio_node)| {
                    LoadedAudioNode::new(condition.clone(), audio_node.clone())
                })
                .collect();
            for audio_node in &audio_nodes {
                self.group_values.attach(audio_node);
            }
            loaded.data.lock().audio_nodes = audio_nodes.clone();
            self.reconcile_all(audio_nodes).await;
        }

        loaded.advance(NodeState::Loaded);
        let fully_loaded = loaded.is_fully_loaded();
        if fully_loaded {
            tracing::debug!("Loaded {}", descriptor.debug_string);
        } else {
            tracing::warn!("Loaded {} with failures", descriptor.debug_string);
        }
        self.events.push(LoaderEvent::NodeLoaded {
            kind: K::KIND,
            slot: node.slot(),
            fully_loaded,
        });
        Some(node)
    }

    async fn unload_task<K: NodeType>(self: Arc<Self>, node: NodePtr<K>) {
        let loaded = node.node().clone();
        match loaded.state() {
            NodeState::Unloaded => {
                self.free(node);
                return;
            }
            NodeState::Loaded => {}
            state => {
                tracing::error!(
                    "{}: unload requested while {:?}",
                    loaded.descriptor.debug_string,
                    state
                );
                return;
            }
        }
        loaded.advance(NodeState::Unloading);
        tracing::debug!("Unloading {}", loaded.descriptor.debug_string);

        let audio_nodes = std::mem::take(&mut loaded.data.lock().audio_nodes);
        if !audio_nodes.is_empty() {
            for audio_node in &audio_nodes {
                self.group_values.detach(audio_node);
            }
            self.reconcile_all(audio_nodes).await;
        }

        let leaves = std::mem::take(&mut loaded.data.lock().leaves);
        self.unload_leaves(leaves).await;

        let children = std::mem::take(&mut loaded.data.lock().children);
        if !children.is_empty() {
            let pending: Vec<_> = children
                .into_iter()
                .map(|child| self.unload_child(child))
                .collect();
            join_all(pending).await;
        }

        let held = std::mem::take(&mut loaded.data.lock().group_value_held);
        if let Some(value) = loaded.descriptor.group_value.as_ref().filter(|_| held) {
            let affected = self.group_values.unload(value);
            self.reconcile_all(affected).await;
        }

        loaded.advance(NodeState::Unloaded);
        self.free(node);
    }

    fn free<K: NodeType>(&self, node: NodePtr<K>) {
        let slot = node.slot();
        if self.storage.remove(K::KIND, slot).is_none() {
            tracing::error!("{} {:?} was not in storage", K::KIND, slot);
        }
        tracing::trace!("Freed {}", node.debug_string());
        self.events.push(LoaderEvent::NodeUnloaded {
            kind: K::KIND,
            slot,
        });
    }

    async fn reconcile_all(self: &Arc<Self>, audio_nodes: Vec<Arc<LoadedAudioNode>>) {
        let pending: Vec<_> = audio_nodes
            .into_iter()
            .map(|audio_node| self.reconcile(audio_node))
            .collect();
        join_all(pending).await;
    }

    /// Converge a branch on its target residency. Resolves once the branch
    /// is idle, which includes any change requested while it was busy.
    fn reconcile(self: &Arc<Self>, audio_node: Arc<LoadedAudioNode>) -> Completion<()> {
        let (promise, completion) = promise::channel();
        let start = {
            let mut state = audio_node.state.lock();
            state.idle_waiters.push(promise);
            !std::mem::replace(&mut state.processing, true)
        };
        if start {
            let guard = ReconcileGuard {
                node: audio_node,
                done: false,
            };
            let inner = self.clone();
            self.tasks
                .spawn_detached(async move { inner.reconcile_task(guard).await });
        }
        completion
    }

    async fn reconcile_task(self: Arc<Self>, guard: ReconcileGuard) {
        let audio_node = guard.node.clone();
        loop {
            let step = {
                let mut state = audio_node.state.lock();
                if audio_node.wanted(&state) {
                    if state.resident.is_none() {
                        ReconcileStep::Load
                    } else {
                        state.processing = false;
                        ReconcileStep::Idle(std::mem::take(&mut state.idle_waiters))
                    }
                } else if let Some(leaves) = state.resident.take() {
                    ReconcileStep::Unload(leaves)
                } else {
                    state.processing = false;
                    ReconcileStep::Idle(std::mem::take(&mut state.idle_waiters))
                }
            };
            match step {
                ReconcileStep::Load => {
                    tracing::trace!("Loading branch {}", audio_node.audio_node.debug_string());
                    let leaves = self.load_leaves(&audio_node.leaves).await;
                    audio_node.state.lock().resident = Some(leaves);
                }
                ReconcileStep::Unload(leaves) => {
                    tracing::trace!("Unloading branch {}", audio_node.audio_node.debug_string());
                    self.unload_leaves(leaves).await;
                }
                ReconcileStep::Idle(waiters) => {
                    guard.finish(waiters);
                    return;
                }
            }
        }
    }

    async fn load_leaves(&self, set: &LeafSet) -> LoadedLeaves {
        let mut leaves = LoadedLeaves::default();
        if set.is_empty() {
            return leaves;
        }

        let banks = request(&*self.sound_banks, &set.sound_banks);
        leaves.failed += self.await_leaves(banks, &mut leaves.sound_banks).await;

        let media = request(&*self.media, &set.media);
        let external_sources = request(&*self.external_sources, &set.external_sources);
        leaves.failed += self.await_leaves(media, &mut leaves.media).await;
        leaves.failed += self
            .await_leaves(external_sources, &mut leaves.external_sources)
            .await;
        leaves
    }

    async fn await_leaves<R: LeafResource>(
        &self,
        pending: Vec<PendingLeaf<R>>,
        out: &mut Vec<ResourceHandle<R>>,
    ) -> usize {
        let mut failed = 0;
        for (id, completion) in pending {
            match completion.await {
                Some(handle) => out.push(handle),
                None => {
                    tracing::warn!("Failed to load {} {}", R::KIND, id);
                    self.events.push(LoaderEvent::LeafFailed { kind: R::KIND, id });
                    failed += 1;
                }
            }
        }
        failed
    }

    async fn unload_leaves(&self, leaves: LoadedLeaves) {
        if leaves.is_empty() {
            return;
        }
        let mut pending: Vec<_> = leaves
            .media
            .into_iter()
            .map(|handle| self.media.unload(handle))
            .collect();
        pending.extend(
            leaves
                .external_sources
                .into_iter()
                .map(|handle| self.external_sources.unload(handle)),
        );
        join_all(pending).await;

        let banks: Vec<_> = leaves
            .sound_banks
            .into_iter()
            .map(|handle| self.sound_banks.unload(handle))
            .collect();
        join_all(banks).await;
    }
}

fn request<R: LeafResource>(manager: &dyn ResourceManager<R>, cooked: &[R]) -> Vec<PendingLeaf<R>> {
    cooked
        .iter()
        .map(|leaf| (leaf.leaf_id(), manager.load(leaf)))
        .collect()
}
