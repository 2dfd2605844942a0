//! Async task execution pool.
//!
//! Engine registrations and loader fan-out run here, off the caller's thread.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use async_executor::{Executor, Task};
use parking_lot::Mutex;

use crate::config::Config;

/// A thread pool for executing async tasks.
///
/// # Example
///
/// ```ignore
/// use resonar_core::TaskPool;
///
/// let pool = TaskPool::new(4)?;
/// let task = pool.spawn(async { 42 }).expect("pool is running");
/// assert_eq!(pollster::block_on(task), 42);
/// ```
pub struct TaskPool {
    executor: Arc<Executor<'static>>,
    threads: Mutex<Vec<thread::JoinHandle<()>>>,
    shutdown: Arc<AtomicBool>,
}

impl TaskPool {
    /// Create a new task pool with the specified number of threads.
    ///
    /// # Panics
    ///
    /// Panics if num_threads is 0.
    pub fn new(num_threads: usize) -> io::Result<Self> {
        assert!(num_threads > 0, "TaskPool must have at least one thread");

        let executor = Arc::new(Executor::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut threads = Vec::with_capacity(num_threads);

        for i in 0..num_threads {
            let exec = executor.clone();
            let shutdown_flag = shutdown.clone();

            let handle = thread::Builder::new()
                .name(format!("resonar-worker-{}", i))
                .spawn(move || {
                    while !shutdown_flag.load(Ordering::Acquire) {
                        if !exec.try_tick() {
                            thread::sleep(Duration::from_millis(1));
                        }
                    }
                });
            match handle {
                Ok(handle) => threads.push(handle),
                Err(e) => {
                    shutdown.store(true, Ordering::Release);
                    return Err(e);
                }
            }
        }

        tracing::debug!("TaskPool created with {} threads", num_threads);

        Ok(Self {
            executor,
            threads: Mutex::new(threads),
            shutdown,
        })
    }

    /// Create a task pool sized from a [`Config`].
    pub fn from_config(config: &Config) -> io::Result<Self> {
        Self::new(config.resolved_worker_threads())
    }

    /// Spawn an async task on the pool.
    ///
    /// Returns `None` once the pool has shut down; the future is dropped
    /// without being polled.
    pub fn spawn<T>(&self, future: impl Future<Output = T> + Send + 'static) -> Option<Task<T>>
    where
        T: Send + 'static,
    {
        if self.is_shutdown() {
            return None;
        }
        Some(self.executor.spawn(future))
    }

    /// Spawn a task whose result nobody awaits.
    pub fn spawn_detached(&self, future: impl Future<Output = ()> + Send + 'static) {
        match self.spawn(future) {
            Some(task) => task.detach(),
            None => tracing::trace!("TaskPool is shut down, dropping task"),
        }
    }

    /// Get the number of threads in this pool.
    pub fn thread_count(&self) -> usize {
        self.threads.lock().len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Stop the worker threads, then drain whatever was still queued on the
    /// calling thread so no awaiting future is left pending forever.
    ///
    /// Tasks spawned after this call are dropped unpolled.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        let threads = std::mem::take(&mut *self.threads.lock());
        tracing::debug!("Shutting down TaskPool with {} threads", threads.len());

        let current = thread::current().id();
        for handle in threads {
            if handle.thread().id() == current {
                continue;
            }
            if let Err(e) = handle.join() {
                tracing::error!("Task pool thread panicked: {:?}", e);
            }
        }

        while self.executor.try_tick() {}
        tracing::debug!("TaskPool shutdown complete");
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_pool_creation() {
        let pool = TaskPool::new(2).unwrap();
        assert_eq!(pool.thread_count(), 2);
    }

    #[test]
    fn test_spawn_and_await() {
        let pool = TaskPool::new(2).unwrap();
        let task = pool.spawn(async { 42 }).unwrap();
        assert_eq!(pollster::block_on(task), 42);
    }

    #[test]
    fn test_multiple_tasks() {
        let pool = TaskPool::new(4).unwrap();

        let tasks: Vec<_> = (0..10)
            .map(|i| pool.spawn(async move { i * 2 }).unwrap())
            .collect();

        let results: Vec<_> = tasks.into_iter().map(pollster::block_on).collect();
        assert_eq!(results, vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18]);
    }

    #[test]
    fn test_from_config() {
        let pool = TaskPool::from_config(&Config::default()).unwrap();
        assert!(pool.thread_count() >= 2);
    }

    #[test]
    #[should_panic(expected = "TaskPool must have at least one thread")]
    fn test_zero_threads_panics() {
        let _ = TaskPool::new(0);
    }

    #[test]
    fn test_spawn_after_shutdown_is_rejected() {
        let pool = TaskPool::new(2).unwrap();
        let _task1 = pool.spawn(async { 1 });
        pool.shutdown();
        assert!(pool.is_shutdown());
        assert_eq!(pool.thread_count(), 0);
        assert!(pool.spawn(async { 2 }).is_none());
        // Second call is a no-op.
        pool.shutdown();
    }
}
