//! Logging bootstrap.
//!
//! Initializes the `tracing-subscriber` infrastructure with environment
//! filter support. Control the log level with `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=debug quark-autosave run config.json
//! RUST_LOG=core_sync=trace,provider_quark=debug quark-autosave run config.json
//! ```

use crate::error::{Result, RuntimeError};
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset (e.g. `"info"`).
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| RuntimeError::Logging(e.to_string()))
}
