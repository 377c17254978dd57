//! # State shared by the engine, its handles and the worker.
//!
//! ```text
//! Engine ──┐
//! EngineHandle (clones) ──┼──► Arc<Shared<P>> { queue, bus, state, stop request, ... }
//! worker task ────────────┘
//! ```
//!
//! [`Shared::finish`] is the single path to `Stopped`: whichever caller gets there first
//! (worker, shutdown, abort) closes the queue, reports discarded items and fires
//! `on_stopped`; later callers are no-ops.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tokio::sync::{Notify, watch};

use crate::core::state::{EngineState, StopCause};
use crate::events::{Bus, Event, EventKind};
use crate::handlers::Handler;
use crate::policies::StopMode;
use crate::queue::{DelayQueue, StartId, TagSet};
use crate::subscribers::panic_message;

pub(crate) struct Shared<P> {
    pub name: Arc<str>,
    pub tags: TagSet,
    pub mode: StopMode,
    pub queue: DelayQueue<P>,
    pub bus: Bus,
    pub state: watch::Sender<EngineState>,
    /// Wakes the worker when `stop_self` is called outside of the handler.
    pub stop_signal: Notify,
    stop_request: Mutex<Option<StartId>>,
    last_start_id: Mutex<Option<StartId>>,
    final_start_id: OnceLock<Option<StartId>>,
}

impl<P> Shared<P> {
    pub fn new(name: Arc<str>, tags: TagSet, mode: StopMode, bus: Bus) -> Self {
        let (state, _) = watch::channel(EngineState::Initializing);
        Self {
            name,
            tags,
            mode,
            queue: DelayQueue::new(),
            bus,
            state,
            stop_signal: Notify::new(),
            stop_request: Mutex::new(None),
            last_start_id: Mutex::new(None),
            final_start_id: OnceLock::new(),
        }
    }

    /// New event stamped with this engine's name.
    pub fn event(&self, kind: EventKind) -> Event {
        Event::new(kind).with_engine(Arc::clone(&self.name))
    }

    pub fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }

    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Moves `from → to`; returns false if the engine was not in `from`.
    pub fn transition(&self, from: EngineState, to: EngineState) -> bool {
        self.state.send_if_modified(|s| {
            if *s == from {
                *s = to;
                true
            } else {
                false
            }
        })
    }

    /// Records a direct stop; the first request wins.
    pub fn set_stop_request(&self, start_id: StartId) {
        let mut slot = self.stop_request.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert(start_id);
    }

    pub fn take_stop_request(&self) -> Option<StartId> {
        self.stop_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn set_last_start_id(&self, start_id: StartId) {
        *self.last_start_id.lock().unwrap_or_else(PoisonError::into_inner) = Some(start_id);
    }

    pub fn last_start_id(&self) -> Option<StartId> {
        *self.last_start_id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start id reported to `on_stopped`, once the engine is stopped.
    pub fn final_start_id(&self) -> Option<StartId> {
        self.final_start_id.get().copied().flatten()
    }

    pub fn is_finished(&self) -> bool {
        self.final_start_id.get().is_some()
    }

    /// Drives the engine to `Stopped`. Returns false if it was already stopped.
    pub fn finish(&self, handler: &dyn Handler<P>, last: Option<StartId>, cause: StopCause) -> bool
    where
        P: Send + Sync + 'static,
    {
        if self.final_start_id.set(last).is_err() {
            return false;
        }

        let dropped = self.queue.close();
        if dropped > 0 {
            tracing::warn!(engine = %self.name, count = dropped, "discarding items queued at stop");
            self.publish(self.event(EventKind::ItemsDiscarded).with_count(dropped));
        }

        if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| handler.on_stopped(last))) {
            tracing::warn!(
                engine = %self.name,
                info = %panic_message(&*panic),
                "on_stopped panicked"
            );
        }

        self.state.send_replace(EngineState::Stopped);

        let mut ev = self.event(EventKind::EngineStopped).with_reason(cause.as_str());
        ev.start_id = last;
        self.publish(ev);
        tracing::info!(engine = %self.name, last_start_id = ?last, cause = cause.as_str(), "engine stopped");
        true
    }
}
