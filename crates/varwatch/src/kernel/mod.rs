//! Kernel access.
//!
//! [`KernelBridge`] is the only seam through which the daemon talks to the
//! interactive kernel. The kernel is a black box: it runs a snippet and
//! returns the text it printed.

pub mod discovery;
pub mod process;

pub use discovery::{discover_kernels, runtime_dir, KernelInfo};
pub use process::ProcessKernel;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a kernel bridge.
#[derive(Debug, Error)]
pub enum KernelError {
    /// No kernel reference is configured or discoverable.
    #[error("no kernel selected")]
    NoKernel,

    /// The helper process could not be started.
    #[error("failed to start kernel command '{program}'")]
    Spawn {
        /// Program that failed to launch.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The kernel did not answer in time.
    #[error("kernel did not respond within {0:?}")]
    Timeout(Duration),

    /// The snippet raised, or the helper exited unsuccessfully.
    #[error("kernel command failed ({status}): {stderr}")]
    Failed {
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// I/O with the helper process failed.
    #[error("kernel I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A live handle on one kernel.
///
/// Implementations take `&mut self`: callers serialize access, so at most
/// one call is in flight per handle.
#[async_trait]
pub trait KernelBridge: Send {
    /// Runs `snippet` and returns its textual output.
    async fn run(&mut self, snippet: &str) -> Result<String, KernelError>;

    /// Returns the raw variable listing.
    async fn snapshot_variables(&mut self) -> Result<String, KernelError>;

    /// Rebinds this handle to another kernel.
    async fn switch_to(&mut self, reference: &str) -> Result<(), KernelError>;

    /// Reference of the kernel currently bound (empty when none).
    fn reference(&self) -> &str;
}
