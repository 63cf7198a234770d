//! The poll loop: read the namespace, push it when it changed, sleep.

use std::sync::Arc;
use std::time::Duration;

use crate::daemon::feed::SnapshotFeed;
use crate::daemon::gate::{KernelGate, Phase};

/// Periodically snapshots the kernel namespace into a [`SnapshotFeed`].
pub struct Poller {
    gate: Arc<KernelGate>,
    feed: Arc<SnapshotFeed>,
    interval: Duration,
}

impl Poller {
    /// Creates a poller ticking every `interval`.
    pub fn new(gate: Arc<KernelGate>, feed: Arc<SnapshotFeed>, interval: Duration) -> Self {
        Self {
            gate,
            feed,
            interval,
        }
    }

    /// Runs until the gate reports [`Phase::Stopping`].
    ///
    /// While paused no snapshot starts; the first tick after a pause runs
    /// immediately instead of waiting out the interval. Kernel errors skip
    /// the tick and leave the last pushed snapshot in place.
    pub async fn run(self) {
        tracing::debug!(interval = ?self.interval, "poll loop started");
        let mut last_error: Option<String> = None;

        loop {
            if self.gate.wait_streaming().await == Phase::Stopping {
                break;
            }

            let (result, force, epoch) = {
                let mut kernel = self.gate.lock().await;
                match self.gate.phase() {
                    Phase::Stopping => break,
                    // A command got in between; let it run first.
                    Phase::Paused => continue,
                    Phase::Streaming => {}
                }
                let force = self.gate.take_refresh();
                let epoch = self.gate.epoch();
                (kernel.snapshot_variables().await, force, epoch)
            };

            match result {
                Ok(raw) => {
                    if last_error.take().is_some() {
                        tracing::info!("kernel snapshots recovered");
                    }
                    self.feed.publish(raw, force);
                }
                Err(e) => {
                    let message = e.to_string();
                    if last_error.as_deref() == Some(message.as_str()) {
                        tracing::debug!(error = %message, "snapshot failed");
                    } else {
                        tracing::warn!(error = %message, "snapshot failed");
                        last_error = Some(message);
                    }
                    if force {
                        // Keep the request for the next successful tick.
                        self.gate.request_refresh();
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.gate.wait_interrupted(epoch) => {}
            }
        }

        tracing::debug!("poll loop stopped");
    }
}
