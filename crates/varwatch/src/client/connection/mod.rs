//! Client connection functionality with retry.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::sleep;

use crate::client::ClientResult;
use crate::frame::{self, FrameError};
use crate::{Command, Reply};

/// Error types for client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Nothing accepted the connection within the retry window.
    #[error(
        "daemon not reachable at {addr} after {attempts} attempts (last error: {}). \
         Is `vw daemon` running?",
        .last_error.as_ref().map(|e| e.to_string()).unwrap_or_else(|| "unknown".to_string())
    )]
    Unreachable {
        /// Address that was tried.
        addr: SocketAddr,
        /// Number of connection attempts made.
        attempts: u32,
        /// The last error encountered during retry attempts.
        #[source]
        last_error: Option<std::io::Error>,
    },

    /// Connection failed with an error retrying cannot fix.
    #[error("connection to daemon failed: {0}")]
    ConnectionFailed(#[source] std::io::Error),

    /// Reading or writing a frame failed.
    #[error("transport error: {0}")]
    Frame(#[from] FrameError),

    /// The daemon closed the connection before replying.
    #[error("daemon closed the connection")]
    Closed,

    /// No reply arrived in time.
    #[error("no reply within {0:?}")]
    ReplyTimeout(Duration),
}

/// Backoff configuration for connection retries.
const INITIAL_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 500;
const MAX_RETRIES: u32 = 10;

/// Default time to wait for a command reply. Generous, because
/// `ExecuteCode` waits for the kernel.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Connects to a daemon listener, retrying with exponential backoff.
///
/// Refused connections are retried (10 ms doubling, capped at 500 ms,
/// 10 attempts); any other error fails immediately.
pub async fn connect(addr: SocketAddr) -> ClientResult<TcpStream> {
    let mut last_error: Option<std::io::Error> = None;

    for attempt in 0..MAX_RETRIES {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                tracing::debug!(%addr, attempt, "connected to daemon");
                return Ok(stream);
            }
            Err(e) if is_retryable(&e) => {
                let delay = calculate_backoff(attempt);
                tracing::debug!(
                    "Connection attempt {} to {} failed: {}, retrying in {:?}",
                    attempt + 1,
                    addr,
                    e,
                    delay
                );
                last_error = Some(e);
                sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(%addr, error = %e, "non-recoverable connection error");
                return Err(ClientError::ConnectionFailed(e));
            }
        }
    }

    Err(ClientError::Unreachable {
        addr,
        attempts: MAX_RETRIES,
        last_error,
    })
}

fn is_retryable(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::TimedOut
    )
}

/// Calculates the backoff delay for a given zero-indexed attempt number.
fn calculate_backoff(attempt: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS.saturating_mul(1u64 << attempt.min(32));
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}

/// A connection on the Command channel.
#[derive(Debug)]
pub struct CommandClient {
    stream: TcpStream,
    reply_timeout: Duration,
}

impl CommandClient {
    /// Wraps an established connection.
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    /// Connects (with backoff) to the Command listener at `addr`.
    pub async fn connect(addr: SocketAddr) -> ClientResult<Self> {
        Ok(Self::new(connect(addr).await?))
    }

    /// Overrides how long [`send`](Self::send) waits for a reply.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Sends one command and, if it has one, waits for its reply.
    ///
    /// Returns `Ok(None)` for commands the daemon does not answer (`Ping`).
    pub async fn send(&mut self, command: &Command) -> ClientResult<Option<Reply>> {
        frame::write_frame(&mut self.stream, &command.to_payload()).await?;
        if !command.expects_reply() {
            return Ok(None);
        }

        let payload = tokio::time::timeout(self.reply_timeout, frame::read_frame(&mut self.stream))
            .await
            .map_err(|_| ClientError::ReplyTimeout(self.reply_timeout))??;
        match payload {
            Some(payload) => Ok(Some(Reply::parse(&payload))),
            None => Err(ClientError::Closed),
        }
    }

    /// Consumes the client and returns the underlying stream.
    pub fn into_stream(self) -> TcpStream {
        self.stream
    }
}
