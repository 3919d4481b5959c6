//! Process-wide tracing setup for the sync API binary.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber: JSON lines on stdout, level selection via
/// `RUST_LOG` with an `info` default. A second call loses the `try_init`
/// race and is silently ignored, which keeps tests that share a process
/// happy.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
