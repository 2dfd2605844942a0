//! Profiling utilities based on the `puffin` crate.
//!
//! With the `profiling` feature off, [`profile_function!`] and
//! [`profile_scope!`] expand to nothing.
//!
//! The puffin scope guard is `!Send`, so these macros belong in synchronous
//! code only, never across an `.await`.

#[cfg(feature = "profiling")]
pub use puffin::{GlobalProfiler, profile_function, profile_scope};

#[cfg(feature = "profiling")]
use std::sync::OnceLock;

#[doc(hidden)]
#[macro_export]
macro_rules! __profile_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "profiling"))]
pub use crate::__profile_noop as profile_function;
#[cfg(not(feature = "profiling"))]
pub use crate::__profile_noop as profile_scope;

/// Global profiling server instance.
#[cfg(feature = "profiling")]
static PROFILING_SERVER: OnceLock<puffin_http::Server> = OnceLock::new();

/// Start collecting scopes and serve them to `puffin_viewer`.
///
/// # Example
/// ```no_run
/// use resonar_core::profiling::init_profiling;
///
/// init_profiling("0.0.0.0:8585");
/// ```
#[cfg(feature = "profiling")]
pub fn init_profiling(address: &str) {
    puffin::set_scopes_on(true);
    if PROFILING_SERVER.get().is_some() {
        return;
    }
    match puffin_http::Server::new(address) {
        Ok(server) => {
            tracing::info!("Puffin profiler server started on http://{}", address);
            let _ = PROFILING_SERVER.set(server);
        }
        Err(e) => {
            tracing::error!("Failed to start puffin server: {}", e);
        }
    }
}

#[cfg(not(feature = "profiling"))]
pub fn init_profiling(_address: &str) {
    tracing::warn!("profiling requested but the `profiling` feature is disabled");
}

/// Mark a frame boundary. Loader benches call this once per iteration.
#[inline]
pub fn new_frame() {
    #[cfg(feature = "profiling")]
    puffin::GlobalProfiler::lock().new_frame();
}
