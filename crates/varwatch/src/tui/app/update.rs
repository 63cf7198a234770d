use super::*;

impl App {
    /// Applies one event from the Broadcast subscription.
    ///
    /// A snapshot replaces the previous one wholesale and re-syncs the
    /// variable panel under its current sort, filter and search. A
    /// disconnect keeps the last snapshot on screen and marks it stale.
    pub fn apply_event(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::Snapshot(snapshot) => {
                self.snapshot = snapshot;
                self.has_snapshot = true;
                self.disconnected = None;
                if self.variables.sync(&self.snapshot) == SortOutcome::FilterEmpty {
                    self.set_error("filter no longer matches, sorted by name".to_string());
                }
            }
            WatchEvent::Disconnected(reason) => {
                tracing::debug!(reason = %reason, "broadcast feed dropped");
                self.disconnected = Some(reason);
            }
        }
    }
}
