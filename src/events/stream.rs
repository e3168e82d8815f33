//! # Broadcast stream of runtime events.
//!
//! [`EventStream`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from the scheduling loop and from every dispatch.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                     Receivers (any):
//!   scheduling loop ──┐
//!   dispatch 1      ──┼──────► EventStream ───────► subscribe_events()
//!   dispatch N      ──┘    (broadcast chan)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct EventStream {
    tx: broadcast::Sender<Event>,
}

impl EventStream {
    /// Creates a new stream with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_publish_reaches_every_receiver() {
        let stream = EventStream::new(8);
        let mut rx1 = stream.subscribe();
        let mut rx2 = stream.subscribe();
        assert_eq!(stream.receiver_count(), 2);

        stream.publish(Event::new(EventKind::Initialized));

        assert_eq!(rx1.recv().await.unwrap().kind, EventKind::Initialized);
        assert_eq!(rx2.recv().await.unwrap().kind, EventKind::Initialized);
    }

    #[test]
    fn test_publish_without_receivers_is_dropped() {
        let stream = EventStream::new(0);
        stream.publish(Event::new(EventKind::Finalized));
        assert_eq!(stream.receiver_count(), 0);
    }
}
