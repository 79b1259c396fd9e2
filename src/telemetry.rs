//! Logging setup

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `default_level`. Calling this twice is harmless:
/// the second install fails and is ignored.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
