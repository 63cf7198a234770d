//! Command implementations for the vw CLI.
//!
//! This module contains all command handler functions, organized by domain:
//! - `config` - Configuration loading and the `config` subcommands
//! - `daemon` - Daemon startup with CLI overrides
//! - `ipc` - One-shot Command channel requests and kernel listing
//! - `tui` - Terminal client startup

pub(crate) mod config;
pub(crate) mod daemon;
pub(crate) mod ipc;
pub(crate) mod tui;

pub(crate) use config::*;
pub(crate) use daemon::*;
pub(crate) use ipc::*;
pub(crate) use tui::*;
