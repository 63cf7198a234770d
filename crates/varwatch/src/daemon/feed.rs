//! Snapshot fan-out to Broadcast subscribers.
//!
//! The poll loop publishes every listing it reads; the feed compares the
//! parsed [`Snapshot`] with the last pushed one and only forwards changes.
//! Each subscriber owns a `broadcast::Receiver`, so dropping the
//! subscriber's task is all it takes to remove it.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::Snapshot;

/// Buffered listings per subscriber before it starts lagging.
const FEED_CAPACITY: usize = 16;

/// A pushed listing: the raw text sent on the wire.
pub type Listing = Arc<str>;

struct Latest {
    snapshot: Snapshot,
    raw: Listing,
}

/// Change-filtered broadcast of variable listings.
pub struct SnapshotFeed {
    tx: broadcast::Sender<Listing>,
    latest: Mutex<Option<Latest>>,
}

impl SnapshotFeed {
    /// Creates an empty feed.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            tx,
            latest: Mutex::new(None),
        }
    }

    /// Offers a freshly read listing.
    ///
    /// Pushes it when its parsed snapshot differs from the last pushed one,
    /// or unconditionally when `force` is set. Returns whether it was pushed.
    pub fn publish(&self, raw: String, force: bool) -> bool {
        let snapshot = Snapshot::parse(&raw);
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        let changed = latest.as_ref().map_or(true, |l| l.snapshot != snapshot);
        if !changed && !force {
            return false;
        }

        let raw: Listing = Arc::from(raw);
        // No receivers is not an error: the listing is kept for the next one.
        let receivers = self.tx.send(Arc::clone(&raw)).unwrap_or(0);
        tracing::debug!(
            variables = snapshot.len(),
            receivers,
            forced = force && !changed,
            "pushed snapshot"
        );
        *latest = Some(Latest { snapshot, raw });
        true
    }

    /// Registers a subscriber.
    ///
    /// Returns the most recently pushed listing (if any) together with a
    /// receiver for everything pushed afterwards, with no gap in between.
    pub fn subscribe(&self) -> (Option<Listing>, broadcast::Receiver<Listing>) {
        let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        let rx = self.tx.subscribe();
        (latest.as_ref().map(|l| Arc::clone(&l.raw)), rx)
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SnapshotFeed {
    fn default() -> Self {
        Self::new()
    }
}
