//! # Event bus.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`]. The worker, the submission path and the
//! subscriber workers publish; the engine's listener forwards to the
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//! EngineHandle (submit/cancel) ──┐
//! Worker (items, stop)      ─────┼──► Bus ──► engine listener ──► SubscriberSet
//! Engine (shutdown)         ─────┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; events with no receiver are dropped.
//! - Capacity is shared by all receivers; laggards see `RecvError::Lagged(n)`.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for engine events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates an independent receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receiver_sees_events_after_subscribe() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::EngineStarted));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::ItemQueued).with_start_id(3));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::ItemQueued);
        assert_eq!(ev.start_id, Some(3));
    }
}
