//! Broadcast channel subscription.
//!
//! Reads listing frames from the daemon, parses each into a [`Snapshot`]
//! and forwards it. There is no automatic reconnect: when the feed drops
//! the subscriber reports [`WatchEvent::Disconnected`] and returns, and the
//! caller decides whether to subscribe again.

use std::net::SocketAddr;

use tokio::sync::mpsc;

use crate::client::connection::connect;
use crate::frame;
use crate::Snapshot;

/// Messages produced by a Broadcast subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// A new namespace snapshot.
    Snapshot(Snapshot),
    /// The feed ended; carries the reason.
    Disconnected(String),
}

/// Follows the Broadcast channel at `addr`, sending events through `tx`.
///
/// Returns when the connection fails, the daemon closes it, or the
/// receiving side of `tx` is dropped.
pub async fn subscribe(addr: SocketAddr, tx: mpsc::Sender<WatchEvent>) {
    let reason = match follow(addr, &tx).await {
        Ok(()) => return,
        Err(reason) => reason,
    };
    tracing::debug!(%addr, reason = %reason, "broadcast feed ended");
    let _ = tx.send(WatchEvent::Disconnected(reason)).await;
}

/// Forwards snapshots until the feed fails. `Ok` means the receiver left.
async fn follow(addr: SocketAddr, tx: &mpsc::Sender<WatchEvent>) -> Result<(), String> {
    let mut stream = connect(addr).await.map_err(|e| e.to_string())?;

    loop {
        match frame::read_frame(&mut stream).await {
            Ok(Some(raw)) => {
                let snapshot = Snapshot::parse(&raw);
                if tx.send(WatchEvent::Snapshot(snapshot)).await.is_err() {
                    return Ok(());
                }
            }
            Ok(None) => return Err("daemon closed the feed".to_string()),
            Err(e) => return Err(e.to_string()),
        }
    }
}
