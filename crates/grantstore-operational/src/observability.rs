//! Tracing setup for processes hosting the operational stores.
//!
//! The filter sits behind a reload layer so the `logging.level` setting can
//! be changed without restarting.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// `RUST_LOG` wins over the configured level when it parses.
fn initial_filter(logging: &LoggingConfig) -> EnvFilter {
    match std::env::var_os("RUST_LOG") {
        Some(_) => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&logging.level)),
        None => EnvFilter::new(&logging.level),
    }
}

/// Installs the global subscriber for `logging`.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes.
pub fn init_tracing(logging: &LoggingConfig) -> bool {
    let (filter, handle) = reload::Layer::new(initial_filter(logging));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok();

    if installed {
        let _ = FILTER_HANDLE.set(handle);
    }
    installed
}

/// Swaps the active filter for `level`.
///
/// Returns `false` if the level does not parse or tracing was not installed
/// by [`init_tracing`].
pub fn apply_logging_level(level: &str) -> bool {
    let Ok(filter) = EnvFilter::try_new(level) else {
        return false;
    };
    FILTER_HANDLE
        .get()
        .is_some_and(|handle| handle.reload(filter).is_ok())
}
