use tracing_subscriber::EnvFilter;

/// Installs a formatted subscriber filtered by `RUST_LOG` (default `info`)
///
/// Calling it more than once is harmless; later calls keep the first subscriber.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
