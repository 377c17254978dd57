//! # Queue entries.
//!
//! A [`WorkItem`] is immutable once submitted; the engine owns it until the handler has
//! returned. The control entry ([`StopRequest`]) shares the queue with regular work so a
//! stop request is handled only after everything submitted before it.

use tokio::time::Instant;

/// Caller-defined classification of delayed work.
pub type Tag = u32;

/// Opaque token threaded from submission to completion.
pub type StartId = u64;

/// A unit of submitted work.
///
/// ## Fields
/// - `payload`: caller data, owned by the engine once submitted
/// - `tag`: `None` for immediate items, the delayed-action tag otherwise
/// - `start_id`: the caller's correlation token
/// - `seq`: monotonic per-engine submission sequence
/// - `ready_at`: earliest dispatch instant (`None` for immediate items)
#[derive(Debug)]
pub struct WorkItem<P> {
    payload: P,
    tag: Option<Tag>,
    start_id: StartId,
    seq: u64,
    submitted_at: Instant,
    ready_at: Option<Instant>,
}

impl<P> WorkItem<P> {
    pub(crate) fn new(
        payload: P,
        tag: Option<Tag>,
        start_id: StartId,
        seq: u64,
        submitted_at: Instant,
        ready_at: Option<Instant>,
    ) -> Self {
        Self {
            payload,
            tag,
            start_id,
            seq,
            submitted_at,
            ready_at,
        }
    }

    /// Returns the payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Returns the tag, if this item was submitted as delayed work.
    pub fn tag(&self) -> Option<Tag> {
        self.tag
    }

    /// Returns the caller's start id.
    pub fn start_id(&self) -> StartId {
        self.start_id
    }

    /// Returns the submission sequence number.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns the submission instant.
    pub fn submitted_at(&self) -> Instant {
        self.submitted_at
    }

    /// Returns the earliest dispatch instant for delayed items.
    pub fn ready_at(&self) -> Option<Instant> {
        self.ready_at
    }

    /// True if the item was submitted with a delay.
    pub fn is_delayed(&self) -> bool {
        self.ready_at.is_some()
    }
}

/// Control entry enqueued by [`EngineHandle::request_stop`](crate::EngineHandle::request_stop).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StopRequest {
    pub start_id: StartId,
    pub last_tag: Option<Tag>,
    pub seq: u64,
}

/// Anything the worker can pop.
#[derive(Debug)]
pub(crate) enum Entry<P> {
    Work(WorkItem<P>),
    Stop(StopRequest),
}

impl<P> Entry<P> {
    /// Tag used for grouped query/cancel. Control entries are never tagged.
    pub fn tag(&self) -> Option<Tag> {
        match self {
            Entry::Work(item) => item.tag,
            Entry::Stop(_) => None,
        }
    }
}
