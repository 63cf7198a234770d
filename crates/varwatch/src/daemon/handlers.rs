//! Command handlers for the daemon's Command channel.
//!
//! Every command runs under a [`PauseGuard`](crate::daemon::gate::PauseGuard),
//! so the poll loop starts no snapshot until the handler returns. Kernel
//! commands additionally hold the kernel lock for the duration of the call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::daemon::feed::SnapshotFeed;
use crate::daemon::gate::KernelGate;
use crate::{Command, Reply};

/// Shared daemon state passed to each connection handler.
#[derive(Clone)]
pub(super) struct DaemonState {
    pub(super) gate: Arc<KernelGate>,
    pub(super) feed: Arc<SnapshotFeed>,
    pub(super) active_connections: Arc<AtomicUsize>,
}

impl DaemonState {
    pub(super) fn connection_opened(&self) -> usize {
        self.active_connections.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(super) fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Handles one decoded command, returning the reply to send (if any).
pub(super) async fn dispatch(command: Command, state: &DaemonState) -> Option<Reply> {
    let _pause = state.gate.pause();
    tracing::debug!(command = %command, "handling command");

    let reply = match command {
        Command::ExecuteCode(code) => handle_execute_command(&code, &state.gate).await,
        Command::SwitchKernel(reference) => handle_switch_command(&reference, &state.gate).await,
        Command::Stop => handle_stop_command(&state.gate),
        Command::Ping => {
            tracing::debug!(
                subscribers = state.feed.subscriber_count(),
                connections = state.active_connections.load(Ordering::Relaxed),
                "ping"
            );
            return None;
        }
    };
    Some(reply)
}

/// Runs `code` in the kernel and replies with its output.
pub(super) async fn handle_execute_command(code: &str, gate: &KernelGate) -> Reply {
    let mut kernel = gate.lock().await;
    match kernel.run(code).await {
        Ok(output) => Reply::Ok(output),
        Err(e) => {
            tracing::warn!(error = %e, "execute failed");
            Reply::Error(e.to_string())
        }
    }
}

/// Rebinds the kernel and schedules a forced snapshot of the new namespace.
pub(super) async fn handle_switch_command(reference: &str, gate: &KernelGate) -> Reply {
    let mut kernel = gate.lock().await;
    match kernel.switch_to(reference).await {
        Ok(()) => {
            gate.request_refresh();
            tracing::info!(kernel = %kernel.reference(), "now watching kernel");
            Reply::Ok(format!("switched to {}", kernel.reference()))
        }
        Err(e) => {
            tracing::warn!(reference = %reference, error = %e, "switch failed");
            Reply::Error(e.to_string())
        }
    }
}

/// Moves the daemon to stopping; both loops exit after their current iteration.
pub(super) fn handle_stop_command(gate: &KernelGate) -> Reply {
    tracing::info!("stop requested by client");
    gate.stop();
    Reply::Ok("stopping".to_string())
}
