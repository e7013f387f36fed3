//! Logging configuration for askbench.
//!
//! Logs go to stderr so stdout stays clean for query results and JSON
//! output. The filter comes from `RUST_LOG`, defaulting to `info`.

use tracing_subscriber::EnvFilter;

/// Initializes stderr logging for the process.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
