//! Scriptable in-memory kernel for daemon unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::kernel::{KernelBridge, KernelError};

pub(crate) const HEADER: &str = "Variable   Type    Data/Info\n------------------------------\n";

#[derive(Default)]
struct FakeState {
    listing: Mutex<String>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    snapshots: AtomicUsize,
    failing: AtomicBool,
}

/// Cloning shares state, so a test keeps one handle while the daemon owns
/// the other.
#[derive(Clone)]
pub(crate) struct FakeKernel {
    state: Arc<FakeState>,
    delay: Duration,
    reference: String,
}

impl FakeKernel {
    pub(crate) fn new() -> Self {
        let kernel = Self {
            state: Arc::default(),
            delay: Duration::ZERO,
            reference: "kernel-test.json".to_string(),
        };
        kernel.set_listing("");
        kernel
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replaces the namespace with `body` lines under the usual header.
    pub(crate) fn set_listing(&self, body: &str) {
        *self.state.listing.lock().unwrap() = format!("{HEADER}{body}");
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.calls.lock().unwrap().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn snapshot_count(&self) -> usize {
        self.state.snapshots.load(Ordering::SeqCst)
    }

    async fn call(&self, label: String) -> Result<(), KernelError> {
        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.state.calls.lock().unwrap().push(label);
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.state.failing.load(Ordering::SeqCst) {
            return Err(KernelError::Failed {
                status: "exit status: 1".to_string(),
                stderr: "NameError: name 'y' is not defined".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl KernelBridge for FakeKernel {
    async fn run(&mut self, snippet: &str) -> Result<String, KernelError> {
        self.call(format!("run:{snippet}")).await?;
        Ok(format!("ran {snippet}"))
    }

    async fn snapshot_variables(&mut self) -> Result<String, KernelError> {
        self.state.snapshots.fetch_add(1, Ordering::SeqCst);
        self.call("snapshot".to_string()).await?;
        Ok(self.state.listing.lock().unwrap().clone())
    }

    async fn switch_to(&mut self, reference: &str) -> Result<(), KernelError> {
        self.call(format!("switch:{reference}")).await?;
        self.reference = reference.to_string();
        Ok(())
    }

    fn reference(&self) -> &str {
        &self.reference
    }
}
