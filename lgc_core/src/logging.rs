//! Tracing setup for the `lgc` binary and unit tests.
//!
//! Filter directives are taken from `LGC_LOG`, then `RUST_LOG`, then the
//! level the caller asks for. Output goes to stderr so stdout carries only
//! command output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crate-specific filter variable, checked before `RUST_LOG`
pub const LOG_ENV: &str = "LGC_LOG";

/// Default level for a given `-v` count
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber at INFO unless overridden
pub fn init() {
    init_with_level("info")
}

/// Install the global subscriber with a fallback level
///
/// A second call is a no-op.
pub fn init_with_level(default_level: &str) {
    let installed = tracing_subscriber::registry()
        .with(filter(default_level))
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();

    if installed.is_err() {
        tracing::debug!("Subscriber already installed");
    }
}

/// Test subscriber routed through the test harness's capture
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("lgc_core=debug"))
        .try_init();
}
