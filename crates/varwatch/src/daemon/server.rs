//! TCP listeners for the Broadcast and Command channels.
//!
//! Both listeners bind to loopback only. The Broadcast channel is a
//! read-only snapshot feed; the Command channel accepts one command frame
//! at a time per connection and answers with a reply frame where the
//! command has one.
//!
//! # Example
//!
//! ```no_run
//! use varwatch::daemon::WatcherServer;
//! use varwatch::kernel::ProcessKernel;
//! use varwatch::DaemonConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = DaemonConfig::default();
//!     let kernel = ProcessKernel::from_config(&config.kernel_bridge, "kernel-1.json");
//!     let server = WatcherServer::bind(&config, Box::new(kernel)).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use crate::daemon::feed::{Listing, SnapshotFeed};
use crate::daemon::gate::KernelGate;
use crate::daemon::handlers::{self, DaemonState};
use crate::daemon::poller::Poller;
use crate::frame::{self, FrameError};
use crate::kernel::KernelBridge;
use crate::{Command, DaemonConfig};

/// Longest a client may take to send the body of a frame once its header
/// has arrived.
pub const FRAME_BODY_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest a single push may wait on a subscriber's socket before the
/// subscriber is dropped as stalled.
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound listeners plus the shared daemon state.
pub struct WatcherServer {
    broadcast: TcpListener,
    command: TcpListener,
    poll_interval: Duration,
    push_timeout: Duration,
    state: DaemonState,
}

impl WatcherServer {
    /// Binds both listeners. Failure to bind either port is fatal.
    pub async fn bind(config: &DaemonConfig, kernel: Box<dyn KernelBridge>) -> io::Result<Self> {
        let broadcast = TcpListener::bind(config.broadcast_addr())
            .await
            .map_err(|e| bind_error("broadcast", config.broadcast_addr(), e))?;
        let command = TcpListener::bind(config.command_addr())
            .await
            .map_err(|e| bind_error("command", config.command_addr(), e))?;

        tracing::info!(
            broadcast = %broadcast.local_addr()?,
            command = %command.local_addr()?,
            "listeners bound"
        );

        Ok(Self {
            broadcast,
            command,
            poll_interval: config.poll_interval,
            push_timeout: PUSH_TIMEOUT,
            state: DaemonState {
                gate: Arc::new(KernelGate::new(kernel)),
                feed: Arc::new(SnapshotFeed::new()),
                active_connections: Arc::new(AtomicUsize::new(0)),
            },
        })
    }

    /// Overrides how long a push may wait on a subscriber that is not reading.
    pub fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout = timeout;
        self
    }

    /// Actual address of the Broadcast listener (useful with port 0).
    pub fn broadcast_addr(&self) -> io::Result<SocketAddr> {
        self.broadcast.local_addr()
    }

    /// Actual address of the Command listener.
    pub fn command_addr(&self) -> io::Result<SocketAddr> {
        self.command.local_addr()
    }

    /// Handle on the kernel gate, e.g. to stop the daemon from a signal.
    pub fn gate(&self) -> Arc<KernelGate> {
        Arc::clone(&self.state.gate)
    }

    /// Handle on the snapshot feed.
    pub fn feed(&self) -> Arc<SnapshotFeed> {
        Arc::clone(&self.state.feed)
    }

    /// Number of currently open connections on either channel.
    pub fn active_connection_count(&self) -> usize {
        self.state
            .active_connections
            .load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Runs the poll loop and both accept loops until the daemon stops.
    pub async fn run(self) {
        let poller = Poller::new(
            Arc::clone(&self.state.gate),
            Arc::clone(&self.state.feed),
            self.poll_interval,
        );
        let poll_task = tokio::spawn(poller.run());

        let push_timeout = self.push_timeout;
        tokio::join!(
            accept_loop("broadcast", &self.broadcast, &self.state, |stream, state| {
                serve_subscriber(stream, state, push_timeout)
            }),
            accept_loop("command", &self.command, &self.state, serve_commands),
        );

        if let Err(e) = poll_task.await {
            tracing::error!(error = %e, "poll loop panicked");
        }
        tracing::info!("server stopped");
    }
}

fn bind_error(channel: &str, addr: SocketAddr, e: io::Error) -> io::Error {
    io::Error::new(
        e.kind(),
        format!("failed to bind {channel} listener on {addr}: {e}"),
    )
}

async fn accept_loop<F, Fut>(
    channel: &'static str,
    listener: &TcpListener,
    state: &DaemonState,
    serve: F,
) where
    F: Fn(TcpStream, DaemonState) -> Fut,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    loop {
        tokio::select! {
            result = listener.accept() => match result {
                Ok((stream, peer)) => {
                    let open = state.connection_opened();
                    tracing::debug!(channel, %peer, open, "accepted connection");
                    let task_state = state.clone();
                    let fut = serve(stream, state.clone());
                    tokio::spawn(async move {
                        fut.await;
                        task_state.connection_closed();
                        tracing::debug!(channel, %peer, "connection closed");
                    });
                }
                Err(e) => tracing::error!(channel, error = %e, "accept error"),
            },
            _ = state.gate.stopped() => {
                tracing::debug!(channel, "accept loop stopped");
                break;
            }
        }
    }
}

/// Streams listings to one Broadcast subscriber until it goes away.
///
/// The subscriber first receives the latest pushed listing, then every
/// subsequent push. Anything the peer sends is discarded; a zero-length
/// read means it hung up. A push that cannot complete within
/// `push_timeout` drops the subscriber, and so does a stop arriving while
/// a push is blocked.
async fn serve_subscriber(stream: TcpStream, state: DaemonState, push_timeout: Duration) {
    let (reader, mut writer) = stream.into_split();
    let (latest, mut rx) = state.feed.subscribe();

    if let Some(listing) = latest {
        if !push(&mut writer, &listing, &state.gate, push_timeout).await {
            return;
        }
    }

    let hangup = wait_for_hangup(reader);
    tokio::pin!(hangup);

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(listing) => {
                    if !push(&mut writer, &listing, &state.gate, push_timeout).await {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    tracing::warn!(missed = count, "subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = &mut hangup => {
                tracing::debug!("subscriber hung up");
                break;
            }
            _ = state.gate.stopped() => break,
        }
    }
}

/// Writes one listing. Returns `false` when the subscriber should be dropped.
async fn push(
    writer: &mut OwnedWriteHalf,
    listing: &Listing,
    gate: &KernelGate,
    push_timeout: Duration,
) -> bool {
    tokio::select! {
        written = tokio::time::timeout(push_timeout, frame::write_frame(writer, listing)) => {
            match written {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "subscriber dropped (write failed)");
                    false
                }
                Err(_) => {
                    tracing::warn!(timeout = ?push_timeout, "subscriber stalled, dropping it");
                    false
                }
            }
        }
        _ = gate.stopped() => false,
    }
}

async fn wait_for_hangup(mut reader: OwnedReadHalf) {
    let mut scratch = [0u8; 256];
    loop {
        match reader.read(&mut scratch).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

/// Reads command frames from one Command connection and answers them.
///
/// Unknown tags are logged and ignored; the connection stays open. The
/// connection ends on end of stream, on a transport error, or once the
/// daemon is stopping.
async fn serve_commands(stream: TcpStream, state: DaemonState) {
    let (mut reader, mut writer) = stream.into_split();

    loop {
        let payload = tokio::select! {
            read = frame::read_frame_within(&mut reader, FRAME_BODY_TIMEOUT) => read,
            _ = state.gate.stopped() => break,
        };

        let payload = match payload {
            Ok(Some(payload)) => payload,
            Ok(None) => break,
            Err(FrameError::Timeout(waited)) => {
                tracing::warn!(?waited, "command frame stalled, closing connection");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "command connection failed");
                break;
            }
        };

        let command = match Command::parse(&payload) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring command");
                continue;
            }
        };

        if let Some(reply) = handlers::dispatch(command, &state).await {
            if let Err(e) = frame::write_frame(&mut writer, &reply.to_payload()).await {
                tracing::debug!(error = %e, "could not deliver reply");
                break;
            }
        }
    }
}
