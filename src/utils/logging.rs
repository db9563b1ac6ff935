//! Structured logging setup.
//!
//! The library only emits `tracing` events; installing a subscriber is left to the
//! embedding application. [`init_logging`] is a convenience for applications (and
//! the demos) that want the configured format without wiring it themselves.
//! `RUST_LOG` overrides the configured level when set.

use crate::config::LoggingConfig;
use crate::error::{constants, ReplicationError, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Install a global subscriber built from `config`.
///
/// # Errors
/// - `ConfigError` if the log file cannot be opened
/// - `ConfigError` if a global subscriber is already installed
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string().to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match (config.log_to_file, config.log_file_path.as_deref()) {
        (true, Some(path)) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    ReplicationError::ConfigError(format!("Failed to open log file {path}: {e}"))
                })?;
            let builder = builder.with_writer(Mutex::new(file)).with_ansi(false);
            if config.json_format {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
        _ if config.json_format => builder.json().try_init(),
        _ => builder.try_init(),
    };

    installed.map_err(|_| {
        ReplicationError::ConfigError(constants::ERR_SUBSCRIBER_INSTALLED.to_string())
    })?;

    tracing::info!(app = %config.app_name, level = %config.log_level, "Logging initialized");
    Ok(())
}
