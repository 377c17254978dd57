//! Engine events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `EngineHandle` (queue events), the worker (item and lifecycle events),
//!   `Engine` (shutdown events), `SubscriberSet` workers (overflow/panic).
//! - **Consumer**: the engine listener, which fans out to `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
