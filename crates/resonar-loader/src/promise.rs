//! One-shot promise/completion pairs.
//!
//! A [`Promise`] is fulfilled exactly once, from any thread. Its
//! [`Completion`] can be awaited, blocked on with [`Completion::wait`], or
//! given a continuation with [`Completion::then`], which runs on whichever
//! thread fulfils the promise.
//!
//! Dropping an unfulfilled promise resolves the completion with
//! `T::default()`, so a waiter is never left hanging when a task is torn
//! down.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

type Continuation<T> = Box<dyn FnOnce(T) + Send>;

enum Slot<T> {
    Pending {
        waker: Option<Waker>,
        continuation: Option<Continuation<T>>,
    },
    Ready(T),
    Taken,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
}

/// Create a connected promise and completion.
pub fn channel<T>() -> (Promise<T>, Completion<T>)
where
    T: Default + Send + 'static,
{
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot::Pending {
            waker: None,
            continuation: None,
        }),
    });
    (
        Promise {
            shared: Some(shared.clone()),
        },
        Completion { shared },
    )
}

/// The producing half.
pub struct Promise<T: Default + Send + 'static> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T: Default + Send + 'static> Promise<T> {
    pub fn fulfill(mut self, value: T) {
        if let Some(shared) = self.shared.take() {
            resolve(&shared, value);
        }
    }
}

impl<T: Default + Send + 'static> Drop for Promise<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            tracing::warn!("Promise dropped without a value, resolving with the default");
            resolve(&shared, T::default());
        }
    }
}

impl<T: Default + Send + 'static> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("fulfilled", &self.shared.is_none())
            .finish()
    }
}

fn resolve<T>(shared: &Shared<T>, value: T) {
    let mut slot = shared.slot.lock();
    match std::mem::replace(&mut *slot, Slot::Taken) {
        Slot::Pending {
            continuation: Some(continuation),
            ..
        } => {
            drop(slot);
            continuation(value);
        }
        Slot::Pending { waker, .. } => {
            *slot = Slot::Ready(value);
            drop(slot);
            if let Some(waker) = waker {
                waker.wake();
            }
        }
        other => {
            *slot = other;
            tracing::error!("Promise resolved twice");
        }
    }
}

/// The consuming half. Implements [`Future`].
#[must_use = "a completion does nothing unless awaited, waited on or given a continuation"]
pub struct Completion<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Default + Send + 'static> Completion<T> {
    /// A completion that is already resolved.
    pub fn ready(value: T) -> Self {
        let (promise, completion) = channel();
        promise.fulfill(value);
        completion
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.shared.slot.lock(), Slot::Ready(_))
    }

    /// Run `f` with the value once it is available.
    ///
    /// If the value is already there, `f` runs immediately on this thread.
    pub fn then(self, f: impl FnOnce(T) + Send + 'static) {
        let mut slot = self.shared.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Ready(value) => {
                drop(slot);
                f(value);
            }
            Slot::Pending { .. } => {
                *slot = Slot::Pending {
                    waker: None,
                    continuation: Some(Box::new(f)),
                };
            }
            Slot::Taken => {
                tracing::error!("Completion consumed twice");
            }
        }
    }

    /// A completion resolving to `f(value)`.
    pub fn map<U>(self, f: impl FnOnce(T) -> U + Send + 'static) -> Completion<U>
    where
        U: Default + Send + 'static,
    {
        let (promise, completion) = channel();
        self.then(move |value| promise.fulfill(f(value)));
        completion
    }

    /// Block the current thread until the value is available.
    ///
    /// Never call this from a loader worker thread.
    pub fn wait(self) -> T {
        futures_lite::future::block_on(self)
    }
}

impl<T> Future for Completion<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut slot = self.shared.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Ready(value) => Poll::Ready(value),
            Slot::Pending { continuation, .. } => {
                *slot = Slot::Pending {
                    waker: Some(cx.waker().clone()),
                    continuation,
                };
                Poll::Pending
            }
            Slot::Taken => panic!("Completion polled after it resolved"),
        }
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.shared.slot.lock() {
            Slot::Pending { .. } => "pending",
            Slot::Ready(_) => "ready",
            Slot::Taken => "taken",
        };
        f.debug_struct("Completion").field("state", &state).finish()
    }
}

/// Wait for every completion in `completions`, in order.
pub async fn join_all<T>(completions: Vec<Completion<T>>) -> Vec<T> {
    let mut values = Vec::with_capacity(completions.len());
    for completion in completions {
        values.push(completion.await);
    }
    values
}

/// A completion that resolves once every completion in `completions` has.
pub fn when_all(completions: Vec<Completion<()>>) -> Completion<()> {
    let (promise, completion) = channel();
    if completions.is_empty() {
        promise.fulfill(());
        return completion;
    }
    let remaining = Arc::new(AtomicUsize::new(completions.len()));
    let promise = Arc::new(Mutex::new(Some(promise)));
    for pending in completions {
        let remaining = remaining.clone();
        let promise = promise.clone();
        pending.then(move |()| {
            if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                if let Some(promise) = promise.lock().take() {
                    promise.fulfill(());
                }
            }
        });
    }
    completion
}
