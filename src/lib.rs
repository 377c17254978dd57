//! # flexqueue
//!
//! **flexqueue** is a single-worker, serialized task engine for async Rust.
//!
//! Callers submit work items from any task or thread; one dedicated worker handles them
//! strictly one at a time. Items may be deferred by a delay (retries), grouped by tag for
//! query and cancellation, and the engine decides on its own when it is safe to stop once
//! immediate and delayed work has drained.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   submitters (any thread/task)                 handler (inside the worker)
//!          │  EngineHandle                             │  EngineHandle (ctx)
//!          │  submit / submit_delayed / retry          │  retry, cancel, stop_self
//!          │  cancel_by_tag / has_pending_by_tag       │
//!          │  request_stop / stop_self                 │
//!          ▼                                           ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  DelayQueue  (one mutex; ordered by (ready_at, seq))              │
//! │  immediate items ── ready_at = submission time                    │
//! │  delayed items   ── ready_at = submission time + delay            │
//! │  stop requests   ── control entries, ordered like immediate items │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼ next_ready() (sleeps until head is due)
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Worker loop (one tokio task)                                     │
//! │  - Work  ─► handler.handle(ctx, item) ─► stop policy (Automatic)  │
//! │  - Stop  ─► Draining ─► handler.on_stop_requested (default drain) │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼ publish(Event)
//!                 Bus (broadcast) ─► SubscriberSet ─► LogWriter / custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! Initializing ──start()──► Running ──stop request reached──► Draining
//!                              │                                 │
//!                              ├─ Automatic: nothing else pending│
//!                              ├─ stop_self(start_id) ───────────┤
//!                              └─ shutdown() / OS signal ────────┤
//!                                                                ▼
//!                                        Stopped: queue closed, on_stopped(last_start_id)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                        |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------|
//! | **Engine**        | Build, start, stop and await the worker.                      | [`Engine`], [`EngineBuilder`]             |
//! | **Queue API**     | Submit, delay, retry, query and cancel work by tag.           | [`EngineHandle`], [`TagSet`], [`WorkItem`]|
//! | **Handlers**      | The per-item callback plus stop/fault hooks.                  | [`Handler`], [`HandlerFn`]                |
//! | **Policies**      | Automatic or manual stop; retry backoff with jitter.          | [`StopMode`], [`BackoffPolicy`]           |
//! | **Subscriber API**| Observe engine events (logging, metrics, custom subscribers). | [`Subscribe`], [`Event`]                  |
//! | **Errors**        | Typed usage, handler and runtime errors.                      | [`EngineError`], [`HandlerError`]         |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber that renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use flexqueue::{BackoffPolicy, Engine, EngineHandle, HandlerError, HandlerFn, HandlerRef, StopMode, WorkItem};
//!
//! const RETRY: u32 = 1;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handler: HandlerRef<u32> = HandlerFn::arc(
//!         "flaky",
//!         |ctx: EngineHandle<u32>, item: Arc<WorkItem<u32>>| async move {
//!             let attempt = *item.payload();
//!             if attempt < 2 {
//!                 let backoff = BackoffPolicy::fixed(Duration::from_millis(5));
//!                 ctx.retry(attempt + 1, RETRY, attempt, &backoff, item.start_id())
//!                     .map_err(|e| HandlerError::fail(e.as_message()))?;
//!             }
//!             Ok::<_, HandlerError>(())
//!         },
//!     );
//!
//!     let engine = Engine::builder(handler)
//!         .with_tags([RETRY])
//!         .with_stop_mode(StopMode::Manual)
//!         .build();
//!     engine.start()?;
//!
//!     let handle = engine.handle();
//!     handle.submit(0, 7)?;
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     handle.request_stop(8, None)?;
//!
//!     assert_eq!(engine.stopped().await, Some(8));
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod handlers;
mod policies;
mod queue;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{Engine, EngineBuilder, EngineConfig, EngineHandle, EngineState};
pub use error::{EngineError, HandlerError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use handlers::{Handler, HandlerFault, HandlerFn, HandlerRef};
pub use policies::{BackoffPolicy, JitterPolicy, StopMode};
pub use queue::{StartId, Tag, TagSet, WorkItem};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: a built-in subscriber that renders events through `tracing`.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
