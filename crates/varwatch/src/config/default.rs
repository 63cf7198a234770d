//! Default configuration template and file creation utilities.
//!
//! Provides a commented TOML template that matches `Config::default()`
//! and a function to write it to the XDG config path.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::error::ConfigError;
use crate::config::xdg;

/// A commented TOML template with all default values.
///
/// Every value here must match `Config::default()` from `schema.rs`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r##"# varwatch configuration
#
# All values shown below are the built-in defaults.
# Location: $XDG_CONFIG_HOME/varwatch/config.toml

# ==============================================================================
# Daemon
# ==============================================================================

[daemon]

# Loopback port that streams variable snapshots to subscribers.
broadcast_port = 47601

# Loopback port that accepts commands (execute code, switch kernel, stop).
command_port = 47602

# Delay between namespace polls.
# Examples: "100ms", "500ms", "1s"
poll_interval = "100ms"

# Kernel to watch at startup: a connection file name such as
# "kernel-1234.json" or a full path. Empty picks the newest running kernel.
kernel = ""

# Logging verbosity. The VW_LOG environment variable takes precedence.
# Options: "error", "warn", "info", "debug", "trace"
log_level = "info"

# Path to log file. Empty string means log to stderr.
# Tilde (~) is expanded to the user's home directory.
log_file = ""

# ==============================================================================
# Kernel bridge
# ==============================================================================

[kernel]

# Helper that runs a snippet in the kernel. The snippet is written to its
# standard input and {kernel} is replaced with the kernel reference.
command = ["jupyter", "run", "--existing", "{kernel}", "/dev/stdin"]

# Snippet whose printed output lists the namespace (name, type, preview).
snapshot_snippet = "%whos"

# Maximum time one kernel call may take.
timeout = "10s"

# ==============================================================================
# Terminal client
# ==============================================================================

[tui]

# Rows per page in the variable and kernel panels.
page_size = 20

# Redraw interval.
tick_rate = "250ms"

[tui.theme]

# Color names ("cyan", "darkgray", ...) or hex strings ("#ff8800").
accent = "cyan"
muted = "darkgray"
error = "red"
"##;

/// Creates (or force-overwrites) the default config file.
///
/// - If the file exists and `force` is `false`, returns `ConfigError::AlreadyExists`.
/// - If the file exists and `force` is `true`, backs it up to `.toml.backup` first.
/// - Returns the path where the config was written.
pub fn create_default_config(force: bool) -> Result<PathBuf, ConfigError> {
    let path = xdg::config_path();

    if path.exists() {
        if !force {
            return Err(ConfigError::AlreadyExists { path });
        }
        let backup_path = path.with_extension("toml.backup");
        fs::rename(&path, &backup_path).map_err(|e| ConfigError::WriteError {
            path: backup_path.clone(),
            source: e,
        })?;
        tracing::info!("Backed up existing config to {}", backup_path.display());
    }

    write_default_config(&path)?;
    Ok(path)
}

/// Writes the default template to `path`, creating parent dirs and setting 0600 permissions.
fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    xdg::ensure_config_dir().map_err(write_err)?;
    fs::write(path, DEFAULT_CONFIG_TEMPLATE).map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(write_err)?;
    }

    Ok(())
}
