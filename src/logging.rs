// src/logging.rs

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber.
///
/// The level comes from `RUST_LOG` (default `info`), e.g.
/// `RUST_LOG=production_planner=debug`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Subscriber for tests. Safe to call from every test.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
