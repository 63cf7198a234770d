//! Configuration file loader with position-aware error reporting.
//!
//! Loads TOML configuration from a specific path or the default XDG location.
//! When the default location has no file, returns `Config::default()`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::error::ConfigError;
use crate::config::schema::Config;
use crate::config::xdg;
use crate::tui::theme::Theme;

/// Stateless configuration loader.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a specific path.
    ///
    /// Returns `ConfigError::NotFound` if the file does not exist, or
    /// `ConfigError::ReadError` for other I/O failures.
    pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::ReadError {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::parse_toml(&content, path)
    }

    /// Load configuration from the default XDG location.
    ///
    /// If no file exists at the default path, returns `Config::default()`
    /// instead of an error.
    pub fn load_default() -> Result<Config, ConfigError> {
        let path = xdg::config_path();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            tracing::debug!("No config file at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Checks values that TOML typing alone cannot.
    ///
    /// Durations and theme colors must parse, the two ports must differ,
    /// page size must be positive and the kernel command must name a program.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        parse_duration("daemon.poll_interval", &config.daemon.poll_interval)?;
        parse_duration("kernel.timeout", &config.kernel.timeout)?;
        parse_duration("tui.tick_rate", &config.tui.tick_rate)?;
        Theme::from_config(&config.tui.theme)?;

        if config.daemon.broadcast_port == config.daemon.command_port
            && config.daemon.broadcast_port != 0
        {
            return Err(ConfigError::InvalidValue {
                field: "daemon.command_port".to_string(),
                message: format!(
                    "must differ from broadcast_port ({})",
                    config.daemon.broadcast_port
                ),
            });
        }
        if config.tui.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tui.page_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if config.kernel.command.first().map_or(true, |p| p.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "kernel.command".to_string(),
                message: "must name a program".to_string(),
            });
        }
        Ok(())
    }

    /// Parse a TOML string into `Config` with position-aware error reporting.
    pub(crate) fn parse_toml(content: &str, path: &Path) -> Result<Config, ConfigError> {
        toml::from_str(content).map_err(|e| {
            let (line, column) = e
                .span()
                .map(|span| {
                    let line = content[..span.start].matches('\n').count() + 1;
                    let last_newline = content[..span.start]
                        .rfind('\n')
                        .map(|p| p + 1)
                        .unwrap_or(0);
                    let column = span.start - last_newline + 1;
                    (line, column)
                })
                .unwrap_or((0, 0));
            ConfigError::ParseError {
                path: path.to_path_buf(),
                line,
                column,
                message: e.message().to_string(),
            }
        })
    }
}

/// Parses a human-readable duration field such as `"100ms"`.
pub fn parse_duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value).map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("'{value}' is not a duration ({e})"),
    })
}
