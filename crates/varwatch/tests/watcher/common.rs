//! Shared harness: a scripted kernel and a running daemon.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use varwatch::daemon::{KernelGate, SnapshotFeed, WatcherServer};
use varwatch::frame;
use varwatch::kernel::{KernelBridge, KernelError};
use varwatch::DaemonConfig;

/// Header lines every listing starts with.
pub const LISTING_HEADER: &str = "Variable   Type    Data/Info\n-----------------------------\n";

/// How long a test waits for something that should happen.
pub const WAIT: Duration = Duration::from_secs(3);

#[derive(Default)]
struct Script {
    namespace: Vec<(String, String, String)>,
    fail_runs: bool,
    delay: Duration,
}

/// Kernel whose namespace and failures the test controls.
///
/// Clones share the script and counters; the daemon owns one clone.
#[derive(Clone, Default)]
pub struct ScriptedKernel {
    script: Arc<Mutex<Script>>,
    busy: Arc<AtomicUsize>,
    peak_busy: Arc<AtomicUsize>,
    snapshots: Arc<AtomicUsize>,
    reference: String,
}

impl ScriptedKernel {
    pub fn new() -> Self {
        Self {
            reference: "kernel-e2e.json".to_string(),
            ..Self::default()
        }
    }

    /// Every kernel call takes at least `delay`.
    pub fn slow(self, delay: Duration) -> Self {
        self.script.lock().unwrap().delay = delay;
        self
    }

    /// Adds or replaces one variable.
    pub fn define(&self, name: &str, type_tag: &str, value: &str) {
        let mut script = self.script.lock().unwrap();
        script.namespace.retain(|(n, _, _)| n != name);
        script
            .namespace
            .push((name.to_string(), type_tag.to_string(), value.to_string()));
    }

    /// Makes `run` fail like a snippet that raised.
    pub fn fail_runs(&self) {
        self.script.lock().unwrap().fail_runs = true;
    }

    /// Highest number of kernel calls observed at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_busy.load(Ordering::SeqCst)
    }

    /// Number of snapshot calls so far.
    pub fn snapshot_calls(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }

    fn listing(&self) -> String {
        let script = self.script.lock().unwrap();
        let mut listing = LISTING_HEADER.to_string();
        for (name, type_tag, value) in &script.namespace {
            listing.push_str(&format!("{name}   {type_tag}   {value}\n"));
        }
        listing
    }

    async fn occupy(&self) {
        let now = self.busy.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_busy.fetch_max(now, Ordering::SeqCst);
        let delay = self.script.lock().unwrap().delay;
        tokio::time::sleep(delay).await;
        self.busy.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl KernelBridge for ScriptedKernel {
    async fn run(&mut self, snippet: &str) -> Result<String, KernelError> {
        self.occupy().await;
        if self.script.lock().unwrap().fail_runs {
            return Err(KernelError::Failed {
                status: "exit status: 1".to_string(),
                stderr: format!("NameError: name '{snippet}' is not defined"),
            });
        }
        Ok(format!("out: {snippet}"))
    }

    async fn snapshot_variables(&mut self) -> Result<String, KernelError> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        self.occupy().await;
        Ok(self.listing())
    }

    async fn switch_to(&mut self, reference: &str) -> Result<(), KernelError> {
        self.occupy().await;
        self.reference = reference.to_string();
        Ok(())
    }

    fn reference(&self) -> &str {
        &self.reference
    }
}

/// A daemon running in the background of the current test runtime.
pub struct Daemon {
    pub broadcast: SocketAddr,
    pub command: SocketAddr,
    pub gate: Arc<KernelGate>,
    pub feed: Arc<SnapshotFeed>,
    pub task: JoinHandle<()>,
}

/// Binds on ephemeral ports and starts the daemon.
pub async fn start(kernel: ScriptedKernel, poll_interval: Duration) -> Daemon {
    let config = DaemonConfig {
        broadcast_port: 0,
        command_port: 0,
        poll_interval,
        ..DaemonConfig::default()
    };
    let server = WatcherServer::bind(&config, Box::new(kernel))
        .await
        .expect("bind on ephemeral ports");
    Daemon {
        broadcast: server.broadcast_addr().unwrap(),
        command: server.command_addr().unwrap(),
        gate: server.gate(),
        feed: server.feed(),
        task: tokio::spawn(server.run()),
    }
}

/// Opens a raw connection.
pub async fn dial(addr: SocketAddr) -> TcpStream {
    TcpStream::connect(addr).await.expect("connect to daemon")
}

/// Reads one frame, failing the test if none arrives in time.
pub async fn next_frame(stream: &mut TcpStream) -> String {
    timeout(WAIT, frame::read_frame(stream))
        .await
        .expect("frame within timeout")
        .expect("readable frame")
        .expect("connection still open")
}

/// Waits until `condition` holds, polling every 10 ms.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
