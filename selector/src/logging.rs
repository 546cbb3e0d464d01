//! Tracing setup for the selector CLI.
//!
//! Progress and diagnostics go to stderr so they never mix with the output of
//! `selector diff`, `selector specs` or `selector select`, which is printed on
//! stdout. Test-runner output is not routed through tracing at all.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `info` if unset.
///
/// # Example
/// ```bash
/// RUST_LOG=selector=debug selector select --level 95
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
