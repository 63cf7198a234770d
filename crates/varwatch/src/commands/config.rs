//! Configuration command implementations.
//!
//! Handles `vw config init | path | validate` and the shared config loading
//! used by every other command.

use std::path::Path;
use std::process::ExitCode;

use varwatch::config::error::ConfigError;
use varwatch::config::loader::ConfigLoader;
use varwatch::config::schema::Config;
use varwatch::config::{default, xdg};

/// Loads `path` (or the default location) and validates it.
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config = match path {
        Some(path) => ConfigLoader::load_from_path(path)?,
        None => ConfigLoader::load_default()?,
    };
    ConfigLoader::validate(&config)?;
    Ok(config)
}

/// Writes the default configuration file.
pub(crate) fn run_config_init_command(force: bool) -> ExitCode {
    match default::create_default_config(force) {
        Ok(path) => {
            println!("Created configuration at {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Config error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Prints the default configuration path.
pub(crate) fn run_config_path_command() -> ExitCode {
    println!("{}", xdg::config_path().display());
    ExitCode::SUCCESS
}

/// Loads and validates the configuration, then prints the effective values.
pub(crate) fn run_config_validate_command(path: Option<&Path>) -> ExitCode {
    match load_config(path) {
        Ok(config) => {
            println!("Configuration is valid");
            println!("{config:#?}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Config error: {e}");
            ExitCode::FAILURE
        }
    }
}
