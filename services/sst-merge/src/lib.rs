//! Command-line front end for the SST merge engine.
//!
//! Shared by the `sst-merge` and `sst-inspect` binaries: configuration
//! loading, input discovery, logging setup and the end-of-run summary.

pub mod config;
pub mod discovery;
pub mod summary;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
///
/// Logs go to stderr; stdout is reserved for the run summary.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}
