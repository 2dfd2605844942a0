use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use resonar_core::TaskPool;
use resonar_core::alloc::HashMap;
use resonar_core::profiling::profile_function;
use resonar_test_utils::{EngineHandle, SoundEngine, SoundEngineError, SoundEngineResult};

use super::{LeafResource, ResourceHandle, ResourceManager};
use crate::promise::{self, Completion, Promise};

type LoadPromise<R> = Promise<Option<ResourceHandle<R>>>;

enum EntryState<R: LeafResource> {
    /// Registration in flight. Everyone in `waiters` gets the result.
    Loading { waiters: Vec<LoadPromise<R>> },
    Loaded(EngineHandle),
    /// Unregistration in flight. Loads arriving now restart registration
    /// once it completes.
    Unloading { requeued: Vec<LoadPromise<R>> },
}

struct PoolEntry<R: LeafResource> {
    cooked: R,
    /// Outstanding handles plus pending waiters. Not counted while unloading.
    holders: usize,
    state: EntryState<R>,
}

struct PoolInner<R: LeafResource> {
    engine: Arc<dyn SoundEngine>,
    tasks: Arc<TaskPool>,
    entries: Mutex<HashMap<R::Key, PoolEntry<R>>>,
    registrations: AtomicUsize,
}

/// Snapshot of a pool for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Identities currently tracked in any state.
    pub live: usize,
    /// Registration calls issued since creation.
    pub registrations: usize,
}

/// Generic [`ResourceManager`] backed by a [`SoundEngine`].
///
/// Engine calls run on the [`TaskPool`]. State for one identity is
/// linearized: a load that arrives while the identity is unloading waits for
/// the unregistration, then registers again.
pub struct ResourcePool<R: LeafResource> {
    inner: Arc<PoolInner<R>>,
}

impl<R: LeafResource> Clone for ResourcePool<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

enum LoadAction<R: LeafResource> {
    Register(R),
    Ready(LoadPromise<R>, ResourceHandle<R>),
    Queued,
}

enum UnloadAction<R: LeafResource> {
    Released,
    Unregister(R, EngineHandle),
    Invalid,
}

impl<R: LeafResource> ResourcePool<R> {
    pub fn new(engine: Arc<dyn SoundEngine>, tasks: Arc<TaskPool>) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                engine,
                tasks,
                entries: Mutex::new(HashMap::new()),
                registrations: AtomicUsize::new(0),
            }),
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            live: self.inner.entries.lock().len(),
            registrations: self.inner.registrations.load(Ordering::Relaxed),
        }
    }

    /// Unload whatever `pending` resolves to, once it resolves.
    ///
    /// There is no cancellation: a load is always allowed to finish and is
    /// reversed right after.
    pub fn unload_pending(&self, pending: Completion<Option<ResourceHandle<R>>>) -> Completion<()> {
        let (promise, completion) = promise::channel();
        let pool = self.clone();
        pending.then(move |handle| match handle {
            Some(handle) => pool.unload(handle).then(move |()| promise.fulfill(())),
            None => promise.fulfill(()),
        });
        completion
    }
}

impl<R: LeafResource> ResourceManager<R> for ResourcePool<R> {
    fn load(&self, cooked: &R) -> Completion<Option<ResourceHandle<R>>> {
        profile_function!();
        let (promise, completion) = promise::channel();
        let key = cooked.key();

        let action = {
            let mut entries = self.inner.entries.lock();
            match entries.get_mut(&key) {
                None => {
                    entries.insert(
                        key,
                        PoolEntry {
                            cooked: cooked.clone(),
                            holders: 1,
                            state: EntryState::Loading {
                                waiters: vec![promise],
                            },
                        },
                    );
                    LoadAction::Register(cooked.clone())
                }
                Some(entry) => match &mut entry.state {
                    EntryState::Loading { waiters } => {
                        entry.holders += 1;
                        waiters.push(promise);
                        LoadAction::Queued
                    }
                    EntryState::Loaded(handle) => {
                        entry.holders += 1;
                        let handle = ResourceHandle::new(entry.cooked.clone(), *handle);
                        LoadAction::Ready(promise, handle)
                    }
                    EntryState::Unloading { requeued } => {
                        requeued.push(promise);
                        LoadAction::Queued
                    }
                },
            }
        };

        match action {
            LoadAction::Register(cooked) => {
                tracing::trace!("{} {:?}: registering", R::KIND, key);
                self.inner.start_register(key, cooked);
            }
            LoadAction::Ready(promise, handle) => promise.fulfill(Some(handle)),
            LoadAction::Queued => {
                tracing::trace!("{} {:?}: joined in-flight operation", R::KIND, key);
            }
        }
        completion
    }

    fn unload(&self, handle: ResourceHandle<R>) -> Completion<()> {
        profile_function!();
        let (promise, completion) = promise::channel();
        let key = handle.key();

        let action = {
            let mut entries = self.inner.entries.lock();
            match entries.get_mut(&key) {
                Some(entry) => match entry.state {
                    EntryState::Loaded(engine_handle) => {
                        entry.holders -= 1;
                        if entry.holders > 0 {
                            UnloadAction::Released
                        } else {
                            entry.state = EntryState::Unloading {
                                requeued: Vec::new(),
                            };
                            UnloadAction::Unregister(entry.cooked.clone(), engine_handle)
                        }
                    }
                    _ => UnloadAction::Invalid,
                },
                None => UnloadAction::Invalid,
            }
        };

        match action {
            UnloadAction::Released => promise.fulfill(()),
            UnloadAction::Unregister(cooked, engine_handle) => {
                tracing::trace!("{} {:?}: unregistering", R::KIND, key);
                self.inner
                    .start_unregister(key, cooked, engine_handle, promise);
            }
            UnloadAction::Invalid => {
                tracing::error!("{} {:?}: unloaded while not loaded", R::KIND, key);
                debug_assert!(false, "{} {:?}: unloaded while not loaded", R::KIND, key);
                promise.fulfill(());
            }
        }
        completion
    }

    fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }
}

/// Registration job. If the pool drops it unpolled (shutdown), the waiters
/// are failed instead of left pending.
struct RegisterJob<R: LeafResource> {
    pool: Arc<PoolInner<R>>,
    key: R::Key,
    cooked: R,
    done: bool,
}

impl<R: LeafResource> RegisterJob<R> {
    fn run(mut self) {
        let result = self.cooked.register(&*self.pool.engine);
        self.pool.registrations.fetch_add(1, Ordering::Relaxed);
        self.done = true;
        self.pool.finish_register(self.key, result);
    }
}

impl<R: LeafResource> Drop for RegisterJob<R> {
    fn drop(&mut self) {
        if !self.done {
            self.pool
                .finish_register(self.key, Err(SoundEngineError::Unavailable));
        }
    }
}

/// Unregistration job. Dropped unpolled, it unregisters inline so the
/// engine never keeps a resource nobody tracks.
struct UnregisterJob<R: LeafResource> {
    pool: Arc<PoolInner<R>>,
    key: R::Key,
    cooked: R,
    engine_handle: EngineHandle,
    promise: Option<Promise<()>>,
}

impl<R: LeafResource> UnregisterJob<R> {
    fn run(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if let Some(promise) = self.promise.take() {
            self.cooked.unregister(&*self.pool.engine, self.engine_handle);
            self.pool.finish_unregister(self.key);
            promise.fulfill(());
        }
    }
}

impl<R: LeafResource> Drop for UnregisterJob<R> {
    fn drop(&mut self) {
        self.finish();
    }
}

impl<R: LeafResource> PoolInner<R> {
    fn start_register(self: &Arc<Self>, key: R::Key, cooked: R) {
        let job = RegisterJob {
            pool: self.clone(),
            key,
            cooked,
            done: false,
        };
        self.tasks.spawn_detached(async move { job.run() });
    }

    fn start_unregister(
        self: &Arc<Self>,
        key: R::Key,
        cooked: R,
        engine_handle: EngineHandle,
        promise: Promise<()>,
    ) {
        let job = UnregisterJob {
            pool: self.clone(),
            key,
            cooked,
            engine_handle,
            promise: Some(promise),
        };
        self.tasks.spawn_detached(async move { job.run() });
    }

    fn finish_register(&self, key: R::Key, result: SoundEngineResult<EngineHandle>) {
        let (waiters, cooked, engine_handle) = {
            let mut entries = self.entries.lock();
            let Some(entry) = entries.get_mut(&key) else {
                tracing::error!("{} {:?}: registration finished for unknown entry", R::KIND, key);
                return;
            };
            let waiters = match &mut entry.state {
                EntryState::Loading { waiters } => std::mem::take(waiters),
                _ => {
                    tracing::error!("{} {:?}: registration finished while not loading", R::KIND, key);
                    return;
                }
            };
            match result {
                Ok(engine_handle) => {
                    entry.state = EntryState::Loaded(engine_handle);
                    (waiters, entry.cooked.clone(), Some(engine_handle))
                }
                Err(e) => {
                    tracing::warn!("{} {:?}: registration failed: {}", R::KIND, key, e);
                    let entry = entries.remove(&key);
                    let cooked = match entry {
                        Some(entry) => entry.cooked,
                        None => return,
                    };
                    (waiters, cooked, None)
                }
            }
        };

        for waiter in waiters {
            let handle = engine_handle.map(|h| ResourceHandle::new(cooked.clone(), h));
            waiter.fulfill(handle);
        }
    }

    fn finish_unregister(self: &Arc<Self>, key: R::Key) {
        let restart = {
            let mut entries = self.entries.lock();
            let Some(entry) = entries.get_mut(&key) else {
                tracing::error!("{} {:?}: unregistration finished for unknown entry", R::KIND, key);
                return;
            };
            let requeued = match &mut entry.state {
                EntryState::Unloading { requeued } => std::mem::take(requeued),
                _ => {
                    tracing::error!("{} {:?}: unregistration finished while not unloading", R::KIND, key);
                    return;
                }
            };
            if requeued.is_empty() {
                entries.remove(&key);
                None
            } else {
                entry.holders = requeued.len();
                entry.state = EntryState::Loading { waiters: requeued };
                Some(entry.cooked.clone())
            }
        };

        if let Some(cooked) = restart {
            tracing::trace!("{} {:?}: reloading after unregistration", R::KIND, key);
            self.start_register(key, cooked);
        }
    }
}
