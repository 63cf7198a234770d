//! Daemon module for varwatch.
//!
//! This module provides process lifecycle management, daemonization, and the
//! main entry point for running the watcher daemon.

pub mod feed;
pub mod gate;
mod handlers;
pub mod logging;
pub mod poller;
pub mod server;

#[cfg(test)]
mod fake_kernel;

// Re-export commonly used types for convenience
pub use feed::SnapshotFeed;
pub use gate::{KernelGate, PauseGuard, Phase};
pub use server::WatcherServer;

use std::error::Error;
use std::sync::Arc;

use fork::{daemon, Fork};
use tokio::runtime::Runtime;
use tokio::signal;
use tokio::signal::unix::{signal as unix_signal, SignalKind};
use tracing::{error, info, warn};

use crate::kernel::{discovery, ProcessKernel};
use crate::DaemonConfig;

/// Result type alias for daemon operations.
pub type DaemonResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Wait for a shutdown signal (SIGINT or SIGTERM).
///
/// If SIGTERM handler registration fails, falls back to SIGINT only
/// with a warning message.
async fn wait_for_shutdown() {
    match unix_signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("received SIGINT (Ctrl+C), shutting down");
                },
                _ = sigterm.recv() => {
                    info!("received SIGTERM, shutting down");
                },
            }
        }
        Err(e) => {
            warn!(error = %e, "could not register SIGTERM handler, using SIGINT only");
            if let Err(e) = signal::ctrl_c().await {
                error!(error = %e, "failed waiting for SIGINT");
            } else {
                info!("received SIGINT (Ctrl+C), shutting down");
            }
        }
    }
}

/// Stops the daemon on SIGINT/SIGTERM, or returns once it stops otherwise.
async fn stop_on_signal(gate: Arc<KernelGate>) {
    tokio::select! {
        _ = wait_for_shutdown() => gate.stop(),
        _ = gate.stopped() => {}
    }
}

/// Daemonize the current process.
///
/// Forks and detaches from the terminal. The parent exits with code 0 and
/// the child continues as a background daemon.
///
/// # Note
///
/// This function MUST be called BEFORE starting the Tokio runtime,
/// as forking after Tokio initialization corrupts global state for
/// signal handling.
pub fn daemonize_process(nochdir: bool, noclose: bool) -> DaemonResult<()> {
    match daemon(nochdir, noclose) {
        Ok(Fork::Child) => Ok(()),
        Ok(Fork::Parent(_)) => std::process::exit(0),
        Err(e) => Err(Box::new(std::io::Error::other(format!(
            "Failed to daemonize: {}",
            e
        )))),
    }
}

/// Picks the kernel to bind at startup.
///
/// An explicit reference wins; otherwise the newest connection file in the
/// Jupyter runtime directory. Returns an empty reference when nothing is
/// found, in which case snapshots fail until a `SwitchKernel` arrives.
pub fn resolve_kernel(configured: Option<&str>) -> String {
    if let Some(reference) = configured {
        return reference.to_string();
    }
    let newest = discovery::runtime_dir().and_then(|dir| discovery::newest_kernel(&dir));
    match newest {
        Some(kernel) => {
            info!(kernel = %kernel.reference, name = %kernel.kernel_name, "using newest kernel");
            kernel.reference
        }
        None => {
            warn!("no running kernel found; waiting for a switch command");
            String::new()
        }
    }
}

/// Run the daemon with the given configuration.
///
/// Performs daemonization if requested, then starts the Tokio runtime,
/// binds both listeners and runs until a `Stop` command or a signal.
///
/// # Example
///
/// ```no_run
/// use varwatch::{DaemonConfig, daemon::run_daemon};
///
/// let config = DaemonConfig::default();
/// run_daemon(config).expect("Failed to run daemon");
/// ```
pub fn run_daemon(config: DaemonConfig) -> DaemonResult<()> {
    // CRITICAL: Daemonize BEFORE starting Tokio runtime
    if config.daemonize {
        daemonize_process(false, false)?;
    }

    // Initialize logging after daemonize (stderr may be redirected)
    logging::init(config.log_level, config.log_file.as_deref())?;

    info!(
        broadcast = %config.broadcast_addr(),
        command = %config.command_addr(),
        poll_interval = ?config.poll_interval,
        daemonize = config.daemonize,
        "varwatch daemon starting"
    );

    let runtime = Runtime::new().map_err(|e| {
        Box::new(std::io::Error::other(format!(
            "Failed to create Tokio runtime: {}",
            e
        ))) as Box<dyn Error + Send + Sync>
    })?;

    runtime.block_on(async {
        let reference = resolve_kernel(config.kernel.as_deref());
        let kernel = ProcessKernel::from_config(&config.kernel_bridge, reference);
        let server = WatcherServer::bind(&config, Box::new(kernel)).await?;

        tokio::spawn(stop_on_signal(server.gate()));
        info!("daemon running, press Ctrl+C or send SIGTERM to stop");
        server.run().await;
        Ok::<(), Box<dyn Error + Send + Sync>>(())
    })?;

    info!("daemon stopped");
    Ok(())
}
