//! Logging initialization.
//!
//! Controlled by `RUST_LOG` (standard `EnvFilter` syntax); defaults to
//! `warn` so normal runs stay quiet. Output goes to stderr, stdout is
//! reserved for command results.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber. Calling it more than once
/// (integration tests do) is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
