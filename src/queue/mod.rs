//! Work items, tags and the delay queue.
//!
//! ## Contents
//! - [`WorkItem`] a submitted unit of work (payload + tag + start id + sequence)
//! - [`TagSet`]   the closed set of tags an engine accepts for delayed work
//! - `DelayQueue` the timer-ordered store shared by submitters and the worker
//!
//! ## Ordering
//! ```text
//! key = (ready_at, seq)
//!   immediate item  → ready_at = submission instant
//!   delayed item    → ready_at = submission instant + delay
//!   control item    → ready_at = submission instant
//! ```
//! Entries pop in key order: non-decreasing `ready_at`, FIFO by `seq` on ties.

mod delay_queue;
mod item;
mod tags;

pub(crate) use delay_queue::DelayQueue;
pub(crate) use item::{Entry, StopRequest};
pub use item::{StartId, Tag, WorkItem};
pub use tags::TagSet;
