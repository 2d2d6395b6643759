//! Logging init: human-readable lines on stderr, filtered by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Initialize logging to stderr. Defaults to `info`, or `debug` for this
/// crate when `verbose` is set.
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "info,gihyo_ebooks=debug"
    } else {
        "info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
