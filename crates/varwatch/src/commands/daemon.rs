//! Daemon startup command.
//!
//! Builds a [`DaemonConfig`] from the loaded configuration, applies the
//! command-line overrides and hands over to [`run_daemon`].

use std::process::ExitCode;
use std::time::Duration;

use varwatch::config::schema::Config;
use varwatch::daemon::run_daemon;
use varwatch::DaemonConfig;

/// Command-line flags of `vw daemon` that override the config file.
#[derive(Debug, Default)]
pub(crate) struct DaemonOverrides {
    pub(crate) daemonize: bool,
    pub(crate) kernel: Option<String>,
    pub(crate) broadcast_port: Option<u16>,
    pub(crate) command_port: Option<u16>,
    pub(crate) poll_interval: Option<Duration>,
}

impl DaemonOverrides {
    /// Applies every flag that was given.
    pub(crate) fn apply(self, config: &mut DaemonConfig) {
        config.daemonize = self.daemonize;
        if let Some(kernel) = self.kernel.filter(|k| !k.is_empty()) {
            config.kernel = Some(kernel);
        }
        if let Some(port) = self.broadcast_port {
            config.broadcast_port = port;
        }
        if let Some(port) = self.command_port {
            config.command_port = port;
        }
        if let Some(interval) = self.poll_interval {
            config.poll_interval = interval;
        }
    }
}

/// Starts the daemon and blocks until it stops.
pub(crate) fn run_daemon_command(config: &Config, overrides: DaemonOverrides) -> ExitCode {
    let mut daemon_config = match DaemonConfig::from_config(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    overrides.apply(&mut daemon_config);

    if daemon_config.broadcast_port == daemon_config.command_port
        && daemon_config.broadcast_port != 0
    {
        eprintln!(
            "Error: broadcast and command ports must differ (both {})",
            daemon_config.broadcast_port
        );
        return ExitCode::FAILURE;
    }

    // Run the daemon - this will:
    // 1. Call daemonize_process() if --daemonize flag set
    // 2. Start Tokio runtime AFTER daemonization
    // 3. Run until a stop command or shutdown signal
    if let Err(e) = run_daemon(daemon_config) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
