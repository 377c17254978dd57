//! # Timer-ordered queue shared by submitters and the worker.
//!
//! [`DelayQueue`] stores every not-yet-dispatched entry (immediate, delayed and control)
//! in one ordered map keyed by `(ready_at, seq)`, guarded by a single mutex.
//!
//! ## Architecture
//! ```text
//! submitters (many) ──► push_work / push_stop ──┐
//! cancel_tag / has_tag ─────────────────────────┼──► Mutex<State> ◄── next_ready (worker, one)
//!                                               │         │
//!                                               └──► Notify ──► wakes the worker wait
//! ```
//!
//! ## Rules
//! - `next_ready` never busy-spins: it sleeps until the head's `ready_at` or a notification.
//! - Every push and every effective cancel notifies the worker, so a new earlier head or a
//!   removed head re-arms the wait.
//! - `next_ready` is cancel-safe: an entry is only removed in the same poll that returns it.
//! - After `close`, pushes fail with [`EngineError::Stopped`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{self, Instant};

use crate::error::EngineError;
use crate::policies::PendingView;

use super::item::{Entry, StartId, StopRequest, Tag, WorkItem};

/// Cap for absurd delays (`Duration::MAX` and friends).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

struct State<P> {
    entries: BTreeMap<(Instant, u64), Entry<P>>,
    by_tag: HashMap<Tag, usize>,
    untagged: usize,
    next_seq: u64,
    closed: bool,
}

impl<P> State<P> {
    fn count_in(&mut self, tag: Option<Tag>) {
        match tag {
            Some(t) => *self.by_tag.entry(t).or_insert(0) += 1,
            None => self.untagged += 1,
        }
    }

    fn count_out(&mut self, tag: Option<Tag>) {
        match tag {
            Some(t) => {
                if let Some(n) = self.by_tag.get_mut(&t) {
                    *n -= 1;
                    if *n == 0 {
                        self.by_tag.remove(&t);
                    }
                }
            }
            None => self.untagged -= 1,
        }
    }
}

impl<P> PendingView for State<P> {
    fn has_tag(&self, tag: Tag) -> bool {
        self.by_tag.contains_key(&tag)
    }

    fn has_untagged(&self) -> bool {
        self.untagged > 0
    }
}

/// Where a pushed entry landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Queued {
    pub seq: u64,
    pub ready_at: Instant,
}

/// Ordered store of pending entries with an async "next ready" wait.
pub(crate) struct DelayQueue<P> {
    state: Mutex<State<P>>,
    notify: Notify,
}

impl<P> DelayQueue<P> {
    /// Creates an empty, open queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                entries: BTreeMap::new(),
                by_tag: HashMap::new(),
                untagged: 0,
                next_seq: 0,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<P>> {
        // The lock is never held across user code, so a poisoned guard still holds
        // consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues regular work.
    ///
    /// `delay = None` marks an immediate item; `Some(d)` arms a delayed item that becomes
    /// eligible at `now + d` (`Some(ZERO)` is delayed but eligible right away).
    pub fn push_work(
        &self,
        payload: P,
        tag: Option<Tag>,
        start_id: StartId,
        delay: Option<Duration>,
    ) -> Result<Queued, EngineError> {
        self.insert(delay, |seq, now, ready_at| {
            Entry::Work(WorkItem::new(payload, tag, start_id, seq, now, ready_at))
        })
    }

    /// Enqueues the control entry that triggers the drain protocol.
    pub fn push_stop(&self, start_id: StartId, last_tag: Option<Tag>) -> Result<Queued, EngineError> {
        self.insert(None, |seq, _, _| {
            Entry::Stop(StopRequest {
                start_id,
                last_tag,
                seq,
            })
        })
    }

    fn insert(
        &self,
        delay: Option<Duration>,
        build: impl FnOnce(u64, Instant, Option<Instant>) -> Entry<P>,
    ) -> Result<Queued, EngineError> {
        let queued = {
            let mut st = self.lock();
            if st.closed {
                return Err(EngineError::Stopped);
            }
            // `now` is taken under the lock so key order matches seq order for equal delays.
            let now = Instant::now();
            let ready_at = delay.map(|d| now.checked_add(d).unwrap_or(now + FAR_FUTURE));
            let seq = st.next_seq;
            st.next_seq += 1;

            let entry = build(seq, now, ready_at);
            st.count_in(entry.tag());
            let key = (ready_at.unwrap_or(now), seq);
            st.entries.insert(key, entry);
            Queued { seq, ready_at: key.0 }
        };
        self.notify.notify_one();
        Ok(queued)
    }

    /// Removes every pending entry with `tag`; returns how many were removed.
    pub fn cancel_tag(&self, tag: Tag) -> usize {
        let removed = {
            let mut st = self.lock();
            if !st.by_tag.contains_key(&tag) {
                return 0;
            }
            let before = st.entries.len();
            st.entries.retain(|_, e| e.tag() != Some(tag));
            st.by_tag.remove(&tag);
            before - st.entries.len()
        };
        if removed > 0 {
            self.notify.notify_one();
        }
        removed
    }

    /// True iff at least one undispatched entry carries `tag`.
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.lock().by_tag.contains_key(&tag)
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Closes the queue if `pred` accepts the pending state, atomically with the check.
    ///
    /// Entries stay in place until [`close`](Self::close); only new pushes are refused.
    /// Returns `true` if this call closed the queue.
    pub fn close_if(&self, pred: impl FnOnce(&dyn PendingView) -> bool) -> bool {
        let mut st = self.lock();
        if st.closed || !pred(&*st) {
            return false;
        }
        st.closed = true;
        true
    }

    /// Closes the queue and drops every pending entry; returns how many were dropped.
    ///
    /// Idempotent: a second call returns `0`.
    pub fn close(&self) -> usize {
        let dropped = {
            let mut st = self.lock();
            st.closed = true;
            let n = st.entries.len();
            st.entries.clear();
            st.by_tag.clear();
            st.untagged = 0;
            n
        };
        self.notify.notify_one();
        dropped
    }

    /// Waits until the head entry is eligible and pops it.
    ///
    /// Returns `None` once the queue is closed.
    pub async fn next_ready(&self) -> Option<Entry<P>> {
        loop {
            let deadline = match self.poll_head(Instant::now()) {
                Ok(entry) => return Some(entry),
                Err(Head::Closed) => return None,
                Err(Head::Empty) => None,
                Err(Head::Pending(at)) => Some(at),
            };

            match deadline {
                Some(at) => {
                    tokio::select! {
                        _ = self.notify.notified() => {}
                        _ = time::sleep_until(at) => {}
                    }
                }
                None => self.notify.notified().await,
            }
        }
    }

    fn poll_head(&self, now: Instant) -> Result<Entry<P>, Head> {
        let mut st = self.lock();
        if st.closed {
            return Err(Head::Closed);
        }
        let (ready_at, _) = match st.entries.first_key_value() {
            Some((key, _)) => *key,
            None => return Err(Head::Empty),
        };
        if ready_at > now {
            return Err(Head::Pending(ready_at));
        }
        match st.entries.pop_first() {
            Some((_, entry)) => {
                st.count_out(entry.tag());
                Ok(entry)
            }
            None => Err(Head::Empty),
        }
    }
}

#[cfg(test)]
impl<P> DelayQueue<P> {
    fn has_untagged(&self) -> bool {
        self.lock().untagged > 0
    }

    fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn try_next(&self) -> Option<Entry<P>> {
        self.poll_head(Instant::now()).ok()
    }
}

enum Head {
    Empty,
    Closed,
    Pending(Instant),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn work_payload(entry: Option<Entry<&'static str>>) -> &'static str {
        match entry {
            Some(Entry::Work(item)) => item.payload(),
            Some(Entry::Stop(_)) => "<stop>",
            None => "<none>",
        }
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_items_pop_in_submission_order() {
        let q = DelayQueue::new();
        q.push_work("a", None, 1, None).unwrap();
        q.push_work("b", None, 2, None).unwrap();
        q.push_work("c", None, 3, None).unwrap();

        assert_eq!(work_payload(q.next_ready().await), "a");
        assert_eq!(work_payload(q.next_ready().await), "b");
        assert_eq!(work_payload(q.next_ready().await), "c");
        assert_eq!(q.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_items_pop_by_ready_time_then_fifo() {
        let q = DelayQueue::new();
        q.push_work("late-1", Some(1), 1, Some(Duration::from_millis(100))).unwrap();
        q.push_work("early", Some(2), 2, Some(Duration::from_millis(50))).unwrap();
        q.push_work("late-2", Some(1), 3, Some(Duration::from_millis(100))).unwrap();

        assert_eq!(work_payload(q.next_ready().await), "early");
        assert_eq!(work_payload(q.next_ready().await), "late-1");
        assert_eq!(work_payload(q.next_ready().await), "late-2");
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_a_floor() {
        let q = DelayQueue::new();
        let start = Instant::now();
        q.push_work("x", Some(1), 1, Some(Duration::from_millis(200))).unwrap();

        assert!(q.try_next().is_none());
        let _ = q.next_ready().await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_submission_interrupts_wait() {
        let q = Arc::new(DelayQueue::new());
        q.push_work("slow", Some(1), 1, Some(Duration::from_secs(10))).unwrap();

        let q2 = Arc::clone(&q);
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(10)).await;
            q2.push_work("now", None, 2, None).unwrap();
        });

        let start = Instant::now();
        assert_eq!(work_payload(q.next_ready().await), "now");
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn cancel_removes_only_matching_tag() {
        let q = DelayQueue::new();
        for i in 0..3 {
            q.push_work("t1", Some(1), i, Some(Duration::from_secs(5))).unwrap();
        }
        q.push_work("t2", Some(2), 9, Some(Duration::from_secs(5))).unwrap();
        q.push_work("now", None, 10, None).unwrap();

        assert_eq!(q.cancel_tag(1), 3);
        assert!(!q.has_tag(1));
        assert!(q.has_tag(2));
        assert!(q.has_untagged());
        assert_eq!(q.len(), 2);
        assert_eq!(q.cancel_tag(1), 0);
    }

    #[test]
    fn eligible_but_undispatched_counts_as_pending() {
        let q = DelayQueue::new();
        q.push_work("x", Some(4), 1, Some(Duration::ZERO)).unwrap();
        assert!(q.has_tag(4));
        assert_eq!(work_payload(q.try_next()), "x");
        assert!(!q.has_tag(4));
    }

    #[test]
    fn stop_entry_is_untagged_and_ordered() {
        let q = DelayQueue::new();
        q.push_work("a", None, 1, None).unwrap();
        q.push_stop(2, Some(1)).unwrap();
        q.push_work("b", None, 3, None).unwrap();

        assert_eq!(work_payload(q.try_next()), "a");
        match q.try_next() {
            Some(Entry::Stop(req)) => {
                assert_eq!(req.start_id, 2);
                assert_eq!(req.last_tag, Some(1));
            }
            other => panic!("expected stop entry, got {other:?}"),
        }
        assert_eq!(work_payload(q.try_next()), "b");
        assert!(!q.has_untagged());
    }

    #[tokio::test]
    async fn close_rejects_and_reports_dropped() {
        let q = DelayQueue::new();
        q.push_work("a", None, 1, None).unwrap();
        q.push_work("b", Some(1), 2, Some(Duration::from_secs(1))).unwrap();

        assert_eq!(q.close(), 2);
        assert!(q.is_closed());
        assert_eq!(q.push_work("c", None, 3, None), Err(EngineError::Stopped));
        assert!(q.push_stop(4, None).is_err());
        assert!(q.next_ready().await.is_none());
        assert_eq!(q.close(), 0);
    }

    #[test]
    fn close_if_checks_under_the_lock() {
        let q = DelayQueue::new();
        q.push_work("t1", Some(1), 1, Some(Duration::from_secs(5))).unwrap();

        assert!(!q.close_if(|p| !p.has_tag(1)));
        assert!(!q.is_closed());
        assert!(q.close_if(|p| !p.has_untagged()));
        assert_eq!(q.push_work("late", None, 2, None), Err(EngineError::Stopped));
        assert_eq!(q.close(), 1);
    }

    #[test]
    fn huge_delay_does_not_overflow() {
        let q: DelayQueue<()> = DelayQueue::new();
        let queued = q.push_work((), Some(1), 1, Some(Duration::MAX)).unwrap();
        assert!(queued.ready_at > Instant::now());
    }
}
