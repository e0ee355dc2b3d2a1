//! Logging infrastructure for threadlens
//!
//! The crate itself only emits `tracing` events (dropped records,
//! fallbacks). These helpers are for host processes and tests that want
//! a subscriber without wiring one themselves.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize a stderr subscriber filtered by `RUST_LOG`.
///
/// Intended for host binaries embedding this crate; returns quietly if a
/// global subscriber is already installed.
pub fn init() {
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Initialize logging for tests (captured per-test output).
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
