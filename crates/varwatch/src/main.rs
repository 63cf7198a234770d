//! varwatch - CLI entry point
//!
//! This binary runs the watcher daemon, the terminal client, and one-shot
//! commands that talk to a running daemon over its Command channel.

mod commands;

use varwatch::config::schema::Config;
use varwatch::Command;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

/// Watch the variable namespace of a running kernel
#[derive(Parser)]
#[command(name = "vw")]
#[command(version, about = "Watch the variable namespace of a running kernel")]
pub(crate) struct Cli {
    /// Configuration file (defaults to $XDG_CONFIG_HOME/varwatch/config.toml)
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Available subcommands for the vw CLI
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Start the watcher daemon
    Daemon {
        /// Run as a background daemon (detached from terminal)
        #[arg(long)]
        daemonize: bool,

        /// Kernel connection file to watch (defaults to the newest one)
        #[arg(long)]
        kernel: Option<String>,

        /// Port of the Broadcast listener
        #[arg(long)]
        broadcast_port: Option<u16>,

        /// Port of the Command listener
        #[arg(long)]
        command_port: Option<u16>,

        /// Delay between namespace polls, e.g. "100ms"
        #[arg(long, value_parser = humantime::parse_duration)]
        poll_interval: Option<Duration>,
    },

    /// Launch the terminal user interface
    Tui,

    /// Run a snippet in the watched kernel and print its output
    Exec {
        /// Code to run
        code: String,
    },

    /// Watch another kernel
    Switch {
        /// Kernel connection file, as listed by `vw kernels`
        reference: String,
    },

    /// Stop the running daemon
    Stop,

    /// Check that the daemon accepts commands
    Ping,

    /// List kernels found in the Jupyter runtime directory
    Kernels,

    /// Manage configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Actions for the `config` subcommand.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Create default configuration file
    Init {
        /// Overwrite existing configuration (creates backup)
        #[arg(long)]
        force: bool,
    },
    /// Show configuration file path
    Path,
    /// Validate configuration file
    Validate,
}

fn main() -> ExitCode {
    // Parse CLI arguments BEFORE any fork/runtime operations
    // This ensures errors are shown to the user in the terminal
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Daemon {
            daemonize,
            kernel,
            broadcast_port,
            command_port,
            poll_interval,
        } => with_config(config_path, |config| {
            commands::run_daemon_command(
                config,
                commands::DaemonOverrides {
                    daemonize,
                    kernel,
                    broadcast_port,
                    command_port,
                    poll_interval,
                },
            )
        }),
        Commands::Tui => with_config(config_path, commands::run_tui_command),
        Commands::Exec { code } => with_config(config_path, |config| {
            commands::run_ipc_command(config, Command::ExecuteCode(code))
        }),
        Commands::Switch { reference } => with_config(config_path, |config| {
            commands::run_ipc_command(config, Command::SwitchKernel(reference))
        }),
        Commands::Stop => with_config(config_path, |config| {
            commands::run_ipc_command(config, Command::Stop)
        }),
        Commands::Ping => with_config(config_path, |config| {
            commands::run_ipc_command(config, Command::Ping)
        }),
        Commands::Kernels => commands::run_kernels_command(),
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::run_config_init_command(force),
            ConfigAction::Path => commands::run_config_path_command(),
            ConfigAction::Validate => commands::run_config_validate_command(config_path),
        },
    }
}

/// Loads and validates the configuration, then runs `run` with it.
fn with_config(path: Option<&Path>, run: impl FnOnce(&Config) -> ExitCode) -> ExitCode {
    match commands::load_config(path) {
        Ok(config) => run(&config),
        Err(e) => {
            eprintln!("Config error: {e}");
            ExitCode::FAILURE
        }
    }
}
