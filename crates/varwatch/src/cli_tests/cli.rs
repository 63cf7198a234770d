//! CLI argument parsing tests.

use crate::{Cli, Commands, ConfigAction};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn verify_cli() {
    // Verify the CLI configuration is valid
    Cli::command().debug_assert();
}

#[test]
fn test_missing_subcommand_fails() {
    assert!(Cli::try_parse_from(["vw"]).is_err());
}

#[test]
fn test_daemon_defaults() {
    let cli = Cli::try_parse_from(["vw", "daemon"]).unwrap();
    assert!(cli.config.is_none());
    match cli.command {
        Commands::Daemon {
            daemonize,
            kernel,
            broadcast_port,
            command_port,
            poll_interval,
        } => {
            assert!(!daemonize);
            assert!(kernel.is_none());
            assert!(broadcast_port.is_none());
            assert!(command_port.is_none());
            assert!(poll_interval.is_none());
        }
        _ => panic!("unexpected command variant"),
    }
}

#[test]
fn test_daemon_all_flags() {
    let cli = Cli::try_parse_from([
        "vw",
        "daemon",
        "--daemonize",
        "--kernel",
        "kernel-42.json",
        "--broadcast-port",
        "5001",
        "--command-port",
        "5002",
        "--poll-interval",
        "250ms",
    ])
    .unwrap();
    match cli.command {
        Commands::Daemon {
            daemonize,
            kernel,
            broadcast_port,
            command_port,
            poll_interval,
        } => {
            assert!(daemonize);
            assert_eq!(kernel.as_deref(), Some("kernel-42.json"));
            assert_eq!(broadcast_port, Some(5001));
            assert_eq!(command_port, Some(5002));
            assert_eq!(poll_interval, Some(Duration::from_millis(250)));
        }
        _ => panic!("unexpected command variant"),
    }
}

#[test]
fn test_daemon_rejects_bad_poll_interval() {
    let result = Cli::try_parse_from(["vw", "daemon", "--poll-interval", "soon"]);
    assert!(result.is_err());
}

#[test]
fn test_daemon_rejects_out_of_range_port() {
    let result = Cli::try_parse_from(["vw", "daemon", "--command-port", "70000"]);
    assert!(result.is_err());
}

#[test]
fn test_global_config_flag_after_subcommand() {
    let cli = Cli::try_parse_from(["vw", "tui", "--config", "/tmp/vw.toml"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/vw.toml")));
    assert!(matches!(cli.command, Commands::Tui));
}

#[test]
fn test_exec_takes_code() {
    let cli = Cli::try_parse_from(["vw", "exec", "x = 1"]).unwrap();
    match cli.command {
        Commands::Exec { code } => assert_eq!(code, "x = 1"),
        _ => panic!("unexpected command variant"),
    }
}

#[test]
fn test_exec_requires_code() {
    assert!(Cli::try_parse_from(["vw", "exec"]).is_err());
}

#[test]
fn test_switch_takes_reference() {
    let cli = Cli::try_parse_from(["vw", "switch", "kernel-7.json"]).unwrap();
    match cli.command {
        Commands::Switch { reference } => assert_eq!(reference, "kernel-7.json"),
        _ => panic!("unexpected command variant"),
    }
}

#[test]
fn test_simple_subcommands_parse() {
    assert!(matches!(
        Cli::try_parse_from(["vw", "stop"]).unwrap().command,
        Commands::Stop
    ));
    assert!(matches!(
        Cli::try_parse_from(["vw", "ping"]).unwrap().command,
        Commands::Ping
    ));
    assert!(matches!(
        Cli::try_parse_from(["vw", "kernels"]).unwrap().command,
        Commands::Kernels
    ));
}

#[test]
fn test_config_init_force() {
    let cli = Cli::try_parse_from(["vw", "config", "init", "--force"]).unwrap();
    match cli.command {
        Commands::Config {
            action: ConfigAction::Init { force },
        } => assert!(force),
        _ => panic!("unexpected command variant"),
    }
}

#[test]
fn test_config_path_and_validate() {
    assert!(matches!(
        Cli::try_parse_from(["vw", "config", "path"]).unwrap().command,
        Commands::Config {
            action: ConfigAction::Path
        }
    ));
    assert!(matches!(
        Cli::try_parse_from(["vw", "config", "validate"])
            .unwrap()
            .command,
        Commands::Config {
            action: ConfigAction::Validate
        }
    ));
}

#[test]
fn test_daemon_help_lists_flags() {
    let cmd = Cli::command();
    let daemon_cmd = cmd
        .get_subcommands()
        .find(|sc| sc.get_name() == "daemon")
        .expect("daemon subcommand should exist");
    for id in [
        "daemonize",
        "kernel",
        "broadcast_port",
        "command_port",
        "poll_interval",
    ] {
        assert!(
            daemon_cmd.get_arguments().any(|arg| arg.get_id() == id),
            "--{} flag should exist",
            id
        );
    }
}
