//! Log setup for binaries built on the SDK.
//!
//! The SDK itself only emits `tracing` events; installing a subscriber is
//! left to the application.

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber filtered by `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
