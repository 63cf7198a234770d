//! Exclusive access to the kernel and the daemon's phase.
//!
//! The kernel handle sits behind an async mutex so at most one call is ever
//! in flight. On top of that, command handling engages a [`PauseGuard`]
//! which keeps the poll loop from starting new snapshots until the command
//! completes. The phase is held in a `watch` channel so loops can wait for
//! transitions instead of polling a flag.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{watch, Mutex, MutexGuard};

use crate::kernel::KernelBridge;

/// What the poll loop is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Polling and pushing snapshots.
    Streaming,
    /// A command is being handled; no new snapshots start.
    Paused,
    /// Shutting down; loops exit after their current iteration.
    Stopping,
}

#[derive(Debug, Clone, Copy, Default)]
struct PhaseState {
    stopping: bool,
    pauses: usize,
    /// Bumped every time the last pause is released.
    resumes: u64,
}

impl PhaseState {
    fn phase(self) -> Phase {
        if self.stopping {
            Phase::Stopping
        } else if self.pauses > 0 {
            Phase::Paused
        } else {
            Phase::Streaming
        }
    }
}

/// Shared kernel handle plus the pause contract around it.
pub struct KernelGate {
    kernel: Mutex<Box<dyn KernelBridge>>,
    state: watch::Sender<PhaseState>,
    force_refresh: AtomicBool,
}

impl KernelGate {
    /// Wraps `kernel`; the initial phase is [`Phase::Streaming`].
    pub fn new(kernel: Box<dyn KernelBridge>) -> Self {
        let (state, _) = watch::channel(PhaseState::default());
        Self {
            kernel: Mutex::new(kernel),
            state,
            force_refresh: AtomicBool::new(false),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.state.borrow().phase()
    }

    /// Enters [`Phase::Paused`] until the returned guard is dropped.
    ///
    /// Pauses nest; the daemon returns to streaming when the last guard
    /// goes away. Stopping always wins over pausing.
    pub fn pause(&self) -> PauseGuard<'_> {
        self.state.send_modify(|s| s.pauses += 1);
        PauseGuard { gate: self }
    }

    /// Moves to [`Phase::Stopping`]. Irreversible.
    pub fn stop(&self) {
        self.state.send_modify(|s| s.stopping = true);
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopping(&self) -> bool {
        self.phase() == Phase::Stopping
    }

    /// Waits until the daemon is streaming or stopping, returning which.
    pub async fn wait_streaming(&self) -> Phase {
        self.wait_for(|phase| phase != Phase::Paused).await
    }

    /// Number of completed pauses so far.
    pub fn epoch(&self) -> u64 {
        self.state.borrow().resumes
    }

    /// Waits until the daemon leaves [`Phase::Streaming`] or a pause has
    /// come and gone since `epoch` was read.
    pub async fn wait_interrupted(&self, epoch: u64) {
        let mut rx = self.state.subscribe();
        let _ = rx
            .wait_for(|s| s.phase() != Phase::Streaming || s.resumes != epoch)
            .await;
    }

    /// Resolves once the daemon is stopping.
    pub async fn stopped(&self) {
        self.wait_for(|phase| phase == Phase::Stopping).await;
    }

    async fn wait_for(&self, ready: impl Fn(Phase) -> bool) -> Phase {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let phase = match rx.wait_for(|s| ready(s.phase())).await {
            Ok(state) => state.phase(),
            Err(_) => Phase::Stopping,
        };
        phase
    }

    /// Locks the kernel for one call.
    pub async fn lock(&self) -> MutexGuard<'_, Box<dyn KernelBridge>> {
        self.kernel.lock().await
    }

    /// Asks the poll loop to push its next snapshot even if unchanged.
    pub fn request_refresh(&self) {
        self.force_refresh.store(true, Ordering::SeqCst);
    }

    /// Consumes a pending refresh request.
    pub fn take_refresh(&self) -> bool {
        self.force_refresh.swap(false, Ordering::SeqCst)
    }
}

/// Scoped pause. Dropping it releases the pause on every exit path.
#[must_use = "the pause ends as soon as the guard is dropped"]
pub struct PauseGuard<'a> {
    gate: &'a KernelGate,
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        self.gate.state.send_modify(|s| {
            s.pauses = s.pauses.saturating_sub(1);
            if s.pauses == 0 {
                s.resumes += 1;
            }
        });
    }
}
