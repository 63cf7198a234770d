//! varwatch library
//!
//! This crate provides a daemon that watches the variable namespace of a
//! running interactive kernel and streams snapshots to clients, plus the
//! paginated list view used to browse them.
//!
//! # Platform Support
//!
//! This crate currently supports **Unix-like systems only** (Linux, macOS).
//!
//! Unix-specific features used:
//! - `fork()` for daemon process creation
//! - Unix signal handling (SIGTERM, SIGINT)

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Client side of the two daemon channels.
pub mod client;

/// Configuration utilities including XDG path resolution.
pub mod config;

/// Daemon module providing the poll loop, command loop and process lifecycle.
pub mod daemon;

/// Length-prefixed framing shared by both channels.
pub mod frame;

/// Kernel bridge and kernel discovery.
pub mod kernel;

/// Paginated, sortable, searchable list state.
pub mod listview;

/// TUI module providing the terminal user interface.
pub mod tui;

/// Command channel wire types.
mod ipc;
pub use ipc::*;

/// Variable listing parser.
mod snapshot;
pub use snapshot::{Snapshot, VariableRecord};

use config::error::ConfigError;
use config::loader::parse_duration;
use config::schema::{Config, KernelConfig, LogLevel};

/// Host both listeners bind to. The daemon is never reachable off-host.
pub const BIND_HOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Runtime configuration for the watcher daemon.
///
/// Built from the TOML [`Config`] and then overridden by CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    /// Port of the Broadcast listener. `0` picks an ephemeral port.
    pub broadcast_port: u16,
    /// Port of the Command listener. `0` picks an ephemeral port.
    pub command_port: u16,
    /// Delay between namespace polls.
    pub poll_interval: Duration,
    /// Kernel reference to bind at startup; `None` uses the newest discovered.
    pub kernel: Option<String>,
    /// How snippets reach the kernel.
    pub kernel_bridge: KernelConfig,
    /// Whether to run as a background daemon (detached from terminal).
    pub daemonize: bool,
    /// Fallback log level when `VW_LOG` is unset.
    pub log_level: LogLevel,
    /// Log destination; `None` means stderr.
    pub log_file: Option<PathBuf>,
}

impl DaemonConfig {
    /// Builds the runtime config from the `[daemon]` and `[kernel]` sections.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let daemon = &config.daemon;
        Ok(Self {
            broadcast_port: daemon.broadcast_port,
            command_port: daemon.command_port,
            poll_interval: parse_duration("daemon.poll_interval", &daemon.poll_interval)?,
            kernel: Some(daemon.kernel.trim())
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            kernel_bridge: config.kernel.clone(),
            daemonize: false,
            log_level: daemon.log_level,
            log_file: Some(daemon.log_file.trim())
                .filter(|p| !p.is_empty())
                .map(config::xdg::expand_tilde),
        })
    }

    /// Address of the Broadcast listener.
    pub fn broadcast_addr(&self) -> SocketAddr {
        SocketAddr::from((BIND_HOST, self.broadcast_port))
    }

    /// Address of the Command listener.
    pub fn command_addr(&self) -> SocketAddr {
        SocketAddr::from((BIND_HOST, self.command_port))
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::from_config(&Config::default()).unwrap_or_else(|_| Self {
            broadcast_port: config::schema::DEFAULT_BROADCAST_PORT,
            command_port: config::schema::DEFAULT_COMMAND_PORT,
            poll_interval: Duration::from_millis(100),
            kernel: None,
            kernel_bridge: KernelConfig::default(),
            daemonize: false,
            log_level: LogLevel::Info,
            log_file: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_daemon_config_matches_toml_defaults() {
        let config = DaemonConfig::default();
        assert_eq!(config.broadcast_port, 47601);
        assert_eq!(config.command_port, 47602);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.kernel, None);
        assert_eq!(config.log_file, None);
        assert!(!config.daemonize);
    }

    #[test]
    fn test_addresses_are_loopback() {
        let config = DaemonConfig::default();
        assert!(config.broadcast_addr().ip().is_loopback());
        assert!(config.command_addr().ip().is_loopback());
        assert_eq!(config.command_addr().port(), 47602);
    }

    #[test]
    fn test_from_config_reads_daemon_section() {
        let mut toml = Config::default();
        toml.daemon.poll_interval = "2s".to_string();
        toml.daemon.kernel = "  kernel-5.json ".to_string();
        toml.daemon.log_file = "/tmp/vw.log".to_string();
        let config = DaemonConfig::from_config(&toml).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.kernel.as_deref(), Some("kernel-5.json"));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/vw.log")));
    }

    #[test]
    fn test_from_config_rejects_bad_interval() {
        let mut toml = Config::default();
        toml.daemon.poll_interval = "sometimes".to_string();
        assert!(DaemonConfig::from_config(&toml).is_err());
    }
}
