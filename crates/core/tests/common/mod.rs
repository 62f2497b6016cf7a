//! Shared setup for the integration tests

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Route the solver's `tracing` output through the test harness
///
/// Captured per test and only printed when that test fails. Filter with
/// `RUST_LOG`, default `debug`.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}
