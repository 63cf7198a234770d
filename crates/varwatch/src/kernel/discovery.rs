//! Discovery of running kernels from Jupyter connection files.
//!
//! Every running kernel writes a `kernel-<id>.json` connection file into the
//! Jupyter runtime directory. The file name is the reference the bridge
//! passes to `--existing`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Deserialize;

/// A kernel found in the runtime directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelInfo {
    /// Connection file name, e.g. `kernel-1234.json`.
    pub reference: String,
    /// Kernel spec name from the connection file (`python3`, `ir`, ...).
    pub kernel_name: String,
    /// Last modification time of the connection file.
    pub modified: Option<SystemTime>,
}

impl KernelInfo {
    /// Creates an entry without a modification time.
    pub fn new(reference: impl Into<String>, kernel_name: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            kernel_name: kernel_name.into(),
            modified: None,
        }
    }
}

/// Subset of a connection file we care about.
#[derive(Debug, Deserialize)]
struct ConnectionFile {
    #[serde(default)]
    kernel_name: Option<String>,
}

/// Returns the Jupyter runtime directory.
///
/// Resolution order:
/// 1. `$JUPYTER_RUNTIME_DIR`
/// 2. Platform default:
///    - Linux: `$XDG_DATA_HOME/jupyter/runtime` or `~/.local/share/jupyter/runtime`
///    - macOS: `~/Library/Jupyter/runtime`
pub fn runtime_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("JUPYTER_RUNTIME_DIR") {
        return Some(PathBuf::from(dir));
    }
    platform_runtime_dir()
}

fn platform_runtime_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir().map(|home| home.join("Library").join("Jupyter").join("runtime"))
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::data_dir().map(|data| data.join("jupyter").join("runtime"))
    }
}

/// Lists kernels in `dir`, newest first.
///
/// A missing directory yields an empty list. Unreadable or malformed
/// connection files are still listed, with kernel name `unknown`.
pub fn discover_kernels(dir: &Path) -> io::Result<Vec<KernelInfo>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut kernels = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_connection_file(&name) {
            continue;
        }
        let modified = entry.metadata().and_then(|m| m.modified()).ok();
        let kernel_name = read_kernel_name(&entry.path()).unwrap_or_else(|| "unknown".to_string());
        kernels.push(KernelInfo {
            reference: name,
            kernel_name,
            modified,
        });
    }

    kernels.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.reference.cmp(&b.reference))
    });
    Ok(kernels)
}

/// Returns the most recently started kernel in `dir`, if any.
pub fn newest_kernel(dir: &Path) -> Option<KernelInfo> {
    match discover_kernels(dir) {
        Ok(kernels) => kernels.into_iter().next(),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot list kernels");
            None
        }
    }
}

fn is_connection_file(name: &str) -> bool {
    name.starts_with("kernel-") && name.ends_with(".json")
}

fn read_kernel_name(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let parsed: ConnectionFile = serde_json::from_str(&content).ok()?;
    parsed.kernel_name.filter(|name| !name.is_empty())
}
