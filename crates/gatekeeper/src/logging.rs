//! Tracing setup for hosts that do not install their own subscriber.

use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber filtered by `RUST_LOG`
/// (default `info`).
///
/// Does nothing if a global subscriber is already set, so calling it
/// from several tests is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
