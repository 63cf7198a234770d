//! TOML configuration schema types for varwatch.
//!
//! All structs derive `Deserialize` and `Serialize` with defaults via
//! `#[serde(default)]`, so a partial (or empty) file is valid.
//!
//! Duration fields use human-readable strings (e.g. `"100ms"`, `"10s"`)
//! parsed by the `humantime` crate at the call site.

use serde::{Deserialize, Serialize};

/// Default port of the Broadcast (snapshot feed) listener.
pub const DEFAULT_BROADCAST_PORT: u16 = 47601;

/// Default port of the Command listener.
pub const DEFAULT_COMMAND_PORT: u16 = 47602;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration encompassing all sections.
///
/// ```toml
/// [daemon]
/// [kernel]
/// [tui]
/// [tui.theme]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Watcher daemon settings.
    pub daemon: TomlDaemonConfig,
    /// How the daemon reaches the kernel.
    pub kernel: KernelConfig,
    /// Terminal client settings.
    pub tui: TuiConfig,
}

// ---------------------------------------------------------------------------
// Daemon
// ---------------------------------------------------------------------------

/// Daemon settings from the TOML `[daemon]` section.
///
/// Named `TomlDaemonConfig` to avoid collision with the runtime
/// `crate::DaemonConfig`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TomlDaemonConfig {
    /// Port of the Broadcast listener (loopback only).
    pub broadcast_port: u16,
    /// Port of the Command listener (loopback only).
    pub command_port: u16,
    /// Delay between namespace polls (default `"100ms"`).
    pub poll_interval: String,
    /// Kernel to watch at startup. Empty means the newest discovered kernel.
    pub kernel: String,
    /// Logging verbosity, overridden by `VW_LOG`.
    pub log_level: LogLevel,
    /// Path to log file. Empty string means stderr.
    pub log_file: String,
}

impl Default for TomlDaemonConfig {
    fn default() -> Self {
        Self {
            broadcast_port: DEFAULT_BROADCAST_PORT,
            command_port: DEFAULT_COMMAND_PORT,
            poll_interval: "100ms".to_string(),
            kernel: String::new(),
            log_level: LogLevel::Info,
            log_file: String::new(),
        }
    }
}

/// Log verbosity levels (kebab-case in TOML).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    Warn,
    /// Informational messages (default).
    Info,
    /// Debug-level detail.
    Debug,
    /// Full trace output.
    Trace,
}

impl LogLevel {
    /// The level as an `EnvFilter` directive.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

// ---------------------------------------------------------------------------
// Kernel
// ---------------------------------------------------------------------------

/// How the daemon runs snippets in the kernel (`[kernel]`).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct KernelConfig {
    /// Helper command; the snippet is written to its stdin and
    /// `{kernel}` is replaced by the kernel reference.
    pub command: Vec<String>,
    /// Snippet whose output is the variable listing.
    pub snapshot_snippet: String,
    /// Maximum time a single kernel call may take.
    pub timeout: String,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            command: ["jupyter", "run", "--existing", "{kernel}", "/dev/stdin"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            snapshot_snippet: "%whos".to_string(),
            timeout: "10s".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// TUI
// ---------------------------------------------------------------------------

/// Terminal client settings (`[tui]`).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TuiConfig {
    /// Rows per page in list panels.
    pub page_size: usize,
    /// Render tick rate as a human-readable duration (e.g. `"250ms"`).
    pub tick_rate: String,
    /// Colors used by the renderer.
    pub theme: ThemeConfig,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            tick_rate: "250ms".to_string(),
            theme: ThemeConfig::default(),
        }
    }
}

/// Color names for the terminal client (`[tui.theme]`).
///
/// Values are ratatui color names (`"cyan"`, `"darkgray"`) or hex
/// strings (`"#ff8800"`).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ThemeConfig {
    /// Headers and the selected row.
    pub accent: String,
    /// Secondary text (type tags, hints).
    pub muted: String,
    /// Errors and the disconnected banner.
    pub error: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            accent: "cyan".to_string(),
            muted: "darkgray".to_string(),
            error: "red".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
