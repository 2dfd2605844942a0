//! Resonar Core
//!
//! Shared building blocks for the Resonar audio asset loader: fast hash
//! collections, a generational slab with stable slots, logging, profiling,
//! runtime configuration and the worker [`task_pool::TaskPool`].

pub mod alloc;
pub mod config;
pub mod logging;
pub mod profiling;
pub mod task_pool;

pub use task_pool::TaskPool;
