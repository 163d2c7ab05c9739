//! Publishes series snapshots to live views.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::view::SeriesView;

/// Broadcasts a fresh [`SeriesView`] after every change.
#[derive(Clone)]
pub struct ViewBroadcaster {
    sender: Arc<broadcast::Sender<SeriesView>>,
}

impl ViewBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends a view to all subscribers.
    pub fn publish(&self, view: SeriesView) {
        // No active receivers is fine
        let _ = self.sender.send(view);
    }

    /// Creates a new subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<SeriesView> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ViewBroadcaster {
    fn default() -> Self {
        Self::new(16)
    }
}

impl std::fmt::Debug for ViewBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewBroadcaster")
            .field("receivers", &self.receiver_count())
            .finish()
    }
}
