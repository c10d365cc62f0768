//! Tracing initialization with a configurable and reloadable log level.
//!
//! The engine only emits `tracing` events. Embedders that do not install a
//! subscriber of their own can call [`init_tracing`] once at startup.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

static LOG_RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, tracing_subscriber::Registry>> =
    OnceLock::new();

/// Installs a global `fmt` subscriber filtered by `config.level`.
///
/// `RUST_LOG` takes precedence when set. Returns `false` if a global
/// subscriber was already installed.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    init_tracing_with_level(&config.level)
}

/// Installs a global `fmt` subscriber filtered by `level`.
pub fn init_tracing_with_level(level: &str) -> bool {
    let base_filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let (reload_layer, handle) = reload::Layer::new(base_filter);

    let installed = tracing_subscriber::registry()
        .with(reload_layer)
        .with(fmt::layer())
        .try_init()
        .is_ok();
    if installed {
        let _ = LOG_RELOAD_HANDLE.set(handle);
    }
    installed
}

/// Applies a new log level at runtime.
///
/// Returns `false` if [`init_tracing`] did not install the subscriber.
pub fn apply_logging_level(level: &str) -> bool {
    match LOG_RELOAD_HANDLE.get() {
        Some(handle) => handle
            .modify(|filter| {
                *filter = EnvFilter::new(level);
            })
            .is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig {
            level: "octoid_auth=debug".to_string(),
        };
        let first = init_tracing(&config);
        assert!(!init_tracing(&config));
        assert_eq!(apply_logging_level("warn"), first);
    }
}
