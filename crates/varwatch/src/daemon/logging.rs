//! Logging initialization for the varwatch daemon.
//!
//! Configures the `tracing` subscriber with level filtering via the `VW_LOG`
//! environment variable. Falls back to the configured `daemon.log_level`
//! when the variable is unset or invalid.
//!
//! # Usage
//!
//! ```bash
//! # Configured level (info by default)
//! vw daemon
//!
//! # Debug level
//! VW_LOG=debug vw daemon
//!
//! # Module-specific filtering
//! VW_LOG=varwatch::daemon=trace,warn vw daemon
//! ```

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::schema::LogLevel;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "VW_LOG";

/// Builds the filter: `VW_LOG` if it parses, else `fallback`.
pub fn filter(fallback: LogLevel) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback.as_directive()))
}

/// Initialize the tracing subscriber.
///
/// Output goes to stderr, or is appended to `log_file` when given (without
/// ANSI colors). Returns an error if the log file cannot be opened or a
/// global subscriber is already installed.
pub fn init(
    level: LogLevel,
    log_file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let builder = fmt().with_env_filter(filter(level)).with_target(false);

    let installed = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(Into::into)
}
