//! # Engine events.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata. Events fall into
//! four groups:
//! - **Queue events**: submissions, cancellations, rejected submissions
//! - **Item events**: an item starting, completing or faulting on the worker
//! - **Lifecycle events**: engine started, stop requested, draining, stopped, shutdown
//! - **Subscriber events**: overflow and panics in event subscribers
//!
//! ## Ordering guarantees
//! Each event has a process-wide unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore order across subscribers.
//!
//! ## Example
//! ```rust
//! use flexqueue::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::HandlerFault)
//!     .with_engine("mailer")
//!     .with_tag(2)
//!     .with_start_id(17)
//!     .with_reason("smtp timeout");
//!
//! assert_eq!(ev.kind, EventKind::HandlerFault);
//! assert_eq!(ev.tag, Some(2));
//! assert_eq!(ev.reason.as_deref(), Some("smtp timeout"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::queue::{StartId, Tag};

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of engine events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Queue ===
    /// An item (immediate or delayed) was enqueued.
    ///
    /// Sets: `tag` (delayed only), `start_id`, `item_seq`, `delay_ms` (delayed only).
    ItemQueued,

    /// Pending items of one tag were cancelled.
    ///
    /// Sets: `tag`, `count`.
    TagCancelled,

    /// A submission was rejected (invalid tag or engine stopped).
    ///
    /// Sets: `tag` (if any), `start_id`, `reason` (error label).
    SubmitRejected,

    // === Items ===
    /// The worker is about to invoke the handler.
    ///
    /// Sets: `tag`, `start_id`, `item_seq`.
    ItemStarting,

    /// The handler returned `Ok(())`.
    ///
    /// Sets: `tag`, `start_id`, `item_seq`.
    ItemCompleted,

    /// The handler returned an error or panicked.
    ///
    /// Sets: `tag`, `start_id`, `item_seq`, `reason`.
    HandlerFault,

    // === Lifecycle ===
    /// The worker started.
    EngineStarted,

    /// A stop request was enqueued (ordered behind earlier work).
    ///
    /// Sets: `start_id`, `tag` (the request's last tag), `item_seq`.
    StopRequested,

    /// The worker reached the stop request and entered `Draining`.
    ///
    /// Sets: `start_id`, `tag` (the request's last tag).
    DrainStarted,

    /// The engine reached `Stopped`.
    ///
    /// Sets: `start_id` (last start id, if any), `reason` (what stopped it).
    EngineStopped,

    /// Items still queued at stop were dropped.
    ///
    /// Sets: `count`.
    ItemsDiscarded,

    /// Process shutdown requested via [`Engine::shutdown`](crate::Engine::shutdown).
    ShutdownRequested,

    /// The worker exited within the grace period.
    AllStoppedWithin,

    /// The worker did not exit within the grace period and was aborted.
    GraceExceeded,

    // === Subscribers ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason` (`subscriber=<name> info=<panic>`).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason` (`subscriber=<name> reason=<full|closed>`).
    SubscriberOverflow,
}

/// Engine event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the engine that emitted the event.
    pub engine: Option<Arc<str>>,
    /// Tag of the item involved.
    pub tag: Option<Tag>,
    /// Start id of the item or request involved.
    pub start_id: Option<StartId>,
    /// Queue sequence number of the item involved.
    pub item_seq: Option<u64>,
    /// Requested delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Number of items affected (cancel/discard).
    pub count: Option<u32>,
    /// Human-readable reason (errors, labels, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            engine: None,
            tag: None,
            start_id: None,
            item_seq: None,
            delay_ms: None,
            count: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_engine(mut self, engine: impl Into<Arc<str>>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    #[inline]
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Sets the tag only when present (immediate items carry none).
    #[inline]
    pub fn with_tag_opt(mut self, tag: Option<Tag>) -> Self {
        self.tag = tag;
        self
    }

    #[inline]
    pub fn with_start_id(mut self, start_id: StartId) -> Self {
        self.start_id = Some(start_id);
        self
    }

    #[inline]
    pub fn with_item_seq(mut self, seq: u64) -> Self {
        self.item_seq = Some(seq);
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    /// Attaches a count (saturating).
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n.min(u32::MAX as usize) as u32);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::ItemQueued);
        let b = Event::new(EventKind::ItemQueued);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn delay_saturates() {
        let ev = Event::new(EventKind::ItemQueued).with_delay(Duration::MAX);
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn overflow_reason_names_subscriber() {
        let ev = Event::subscriber_overflow("metrics", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.reason.as_deref(), Some("subscriber=metrics reason=full"));
    }
}
