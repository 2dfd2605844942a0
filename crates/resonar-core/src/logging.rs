use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,resonar_loader=info";

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over the default filter. Calling this more than once is
/// harmless, so every test may call it.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
