//! # EngineHandle: the caller-facing queue API.
//!
//! A cheap, cloneable handle over the engine's shared state. Submitters on any thread or
//! task use it; the handler receives one as its context.
//!
//! ```text
//! submit(payload, start_id)                     ──► immediate item (untagged)
//! submit_delayed(payload, tag, delay, start_id) ──► delayed item, eligible at now + delay
//! retry(payload, tag, attempt, &backoff, id)    ──► submit_delayed with backoff.delay_for(attempt)
//! has_pending_by_tag(tag) / cancel_by_tag(tag)  ──► grouped query / cancel
//! request_stop(start_id, last_tag)              ──► control item, ordered behind earlier work
//! stop_self(start_id)                           ──► direct stop after the current item
//! ```
//!
//! ## Rules
//! - Usage errors are returned synchronously and also published as `SubmitRejected`.
//! - After the engine stopped (or a direct stop was requested) every submission fails with
//!   [`EngineError::Stopped`]; nothing restarts a stopped engine.

use std::sync::Arc;
use std::time::Duration;

use crate::core::shared::Shared;
use crate::core::state::EngineState;
use crate::error::EngineError;
use crate::events::EventKind;
use crate::policies::BackoffPolicy;
use crate::queue::{StartId, Tag, TagSet};

/// Cloneable handle for submitting, querying and cancelling work.
pub struct EngineHandle<P> {
    shared: Arc<Shared<P>>,
}

impl<P> Clone for EngineHandle<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P> EngineHandle<P> {
    pub(crate) fn new(shared: Arc<Shared<P>>) -> Self {
        Self { shared }
    }

    /// Submits an immediate item. Returns its queue sequence number.
    ///
    /// Immediate items run in submission order, behind everything already eligible.
    pub fn submit(&self, payload: P, start_id: StartId) -> Result<u64, EngineError> {
        match self.shared.queue.push_work(payload, None, start_id, None) {
            Ok(q) => {
                self.shared.publish(
                    self.shared
                        .event(EventKind::ItemQueued)
                        .with_start_id(start_id)
                        .with_item_seq(q.seq),
                );
                Ok(q.seq)
            }
            Err(e) => Err(self.reject(e, None, start_id)),
        }
    }

    /// Submits an item that becomes eligible no earlier than `now + delay`.
    ///
    /// Fails with [`EngineError::InvalidTag`] if `tag` is not in the engine's tag set;
    /// nothing is enqueued in that case.
    pub fn submit_delayed(
        &self,
        payload: P,
        tag: Tag,
        delay: Duration,
        start_id: StartId,
    ) -> Result<u64, EngineError> {
        if !self.shared.tags.contains(tag) {
            return Err(self.reject(EngineError::InvalidTag { tag }, Some(tag), start_id));
        }
        match self.shared.queue.push_work(payload, Some(tag), start_id, Some(delay)) {
            Ok(q) => {
                self.shared.publish(
                    self.shared
                        .event(EventKind::ItemQueued)
                        .with_tag(tag)
                        .with_start_id(start_id)
                        .with_item_seq(q.seq)
                        .with_delay(delay),
                );
                Ok(q.seq)
            }
            Err(e) => Err(self.reject(e, Some(tag), start_id)),
        }
    }

    /// Schedules attempt `attempt` (0-based) of a retry under `tag`, delayed by
    /// `backoff.delay_for(attempt)`. Returns the delay that was applied.
    ///
    /// # Example
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use flexqueue::{BackoffPolicy, EngineHandle, HandlerError, WorkItem};
    /// # fn f(ctx: EngineHandle<String>, item: Arc<WorkItem<String>>) -> Result<(), HandlerError> {
    /// const RETRY: u32 = 1;
    /// let backoff = BackoffPolicy::default();
    /// ctx.retry(item.payload().clone(), RETRY, 2, &backoff, item.start_id())
    ///     .map_err(|e| HandlerError::fail(e.as_message()))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn retry(
        &self,
        payload: P,
        tag: Tag,
        attempt: u32,
        backoff: &BackoffPolicy,
        start_id: StartId,
    ) -> Result<Duration, EngineError> {
        let delay = backoff.delay_for(attempt);
        self.submit_delayed(payload, tag, delay, start_id)?;
        Ok(delay)
    }

    /// True iff at least one undispatched item carries `tag`, including items whose delay
    /// already elapsed. Unknown tags report `false`.
    pub fn has_pending_by_tag(&self, tag: Tag) -> bool {
        self.shared.queue.has_tag(tag)
    }

    /// Removes every undispatched item with `tag`. Returns how many were removed.
    ///
    /// A no-op (returning `0`) when nothing matches; fails with
    /// [`EngineError::InvalidTag`] for a tag outside the tag set.
    pub fn cancel_by_tag(&self, tag: Tag) -> Result<usize, EngineError> {
        if !self.shared.tags.contains(tag) {
            return Err(EngineError::InvalidTag { tag });
        }
        let removed = self.shared.queue.cancel_tag(tag);
        if removed > 0 {
            self.shared.publish(
                self.shared
                    .event(EventKind::TagCancelled)
                    .with_tag(tag)
                    .with_count(removed),
            );
        }
        Ok(removed)
    }

    /// Cancels every tag except `keep`. Returns the total number of removed items.
    pub fn cancel_all_except(&self, keep: Option<Tag>) -> usize {
        self.shared
            .tags
            .others(keep)
            .map(|tag| self.cancel_by_tag(tag).unwrap_or(0))
            .sum()
    }

    /// The default drain: cancel every tag except `last_tag`, then stop directly.
    pub fn default_drain(&self, start_id: StartId, last_tag: Option<Tag>) -> Result<(), EngineError> {
        self.cancel_all_except(last_tag);
        self.stop_self(start_id)
    }

    /// Enqueues the stop request behind all work submitted before it.
    ///
    /// When the worker reaches it the engine enters `Draining` and calls
    /// [`Handler::on_stop_requested`](crate::Handler::on_stop_requested). Works in both
    /// stop modes. Returns the request's queue sequence number.
    pub fn request_stop(&self, start_id: StartId, last_tag: Option<Tag>) -> Result<u64, EngineError> {
        if let Some(tag) = last_tag.filter(|t| !self.shared.tags.contains(*t)) {
            return Err(self.reject(EngineError::InvalidTag { tag }, Some(tag), start_id));
        }
        match self.shared.queue.push_stop(start_id, last_tag) {
            Ok(q) => {
                self.shared.publish(
                    self.shared
                        .event(EventKind::StopRequested)
                        .with_tag_opt(last_tag)
                        .with_start_id(start_id)
                        .with_item_seq(q.seq),
                );
                Ok(q.seq)
            }
            Err(e) => Err(self.reject(e, last_tag, start_id)),
        }
    }

    /// Stops the engine after the item currently being handled (immediately when idle).
    ///
    /// New submissions are rejected from this point on; items still queued are discarded
    /// and reported. `start_id` is what `on_stopped` receives. Only the first request
    /// counts; later ones return `Ok(())` without effect until the engine is stopped,
    /// then [`EngineError::Stopped`].
    pub fn stop_self(&self, start_id: StartId) -> Result<(), EngineError> {
        if self.shared.is_finished() {
            return Err(EngineError::Stopped);
        }
        self.shared.set_stop_request(start_id);
        self.shared.queue.close_if(|_| true);
        self.shared.stop_signal.notify_one();
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.shared.state()
    }

    /// The engine's closed tag set.
    pub fn tags(&self) -> &TagSet {
        &self.shared.tags
    }

    /// Engine name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Number of undispatched entries (regular and control).
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    fn reject(&self, err: EngineError, tag: Option<Tag>, start_id: StartId) -> EngineError {
        tracing::warn!(
            engine = %self.shared.name,
            tag = ?tag,
            start_id,
            error = %err,
            "submission rejected"
        );
        self.shared.publish(
            self.shared
                .event(EventKind::SubmitRejected)
                .with_tag_opt(tag)
                .with_start_id(start_id)
                .with_reason(err.as_label()),
        );
        err
    }
}
