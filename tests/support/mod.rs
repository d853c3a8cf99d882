//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod hosts;

use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; honors `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
