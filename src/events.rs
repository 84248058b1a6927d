//! Session lifecycle notifications.
//!
//! The [`Session`](crate::session::Session) emits on connect and disconnect;
//! anything holding a receiver from [`EventBus::subscribe`] hears about it
//! without the session knowing who listens.

use tokio::sync::broadcast;

/// Session lifecycle events. Collaborator calls are only valid between a
/// `Connected` and the next `Disconnected`.
#[derive(Debug, Clone)]
pub enum Event {
    /// A business profile was connected.
    Connected { display_name: String },
    /// The business profile was dropped; the review store is stale.
    Disconnected,
}

/// Broadcast channel of [`Event`]s. Slow receivers lag rather than block.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Returns how many receivers will see the event. Zero is normal.
    pub fn emit(&self, event: Event) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Receive events emitted from now on. Past events are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(16)
    }
}
