//! # Engine: owns the worker task, event delivery and shutdown.
//!
//! ## High-level architecture
//! ```text
//! Engine::builder(handler).with_tags(..).with_stop_mode(..).build()      (Initializing)
//!     │
//! start():
//!   - subscriber_listener(): Bus receiver ─► SubscriberSet::emit(&Event)
//!   - Initializing → Running, publish EngineStarted
//!   - tokio::spawn(worker::run(shared, handler, token))   (span "worker", engine = name)
//!
//! EngineHandle (many) ──► DelayQueue ──► worker ──► handler.handle(ctx, item)
//!
//! Shutdown path:
//!   shutdown() or serve() + OS signal
//!     └─► publish(ShutdownRequested)
//!     └─► token.cancel()              → worker leaves its wait, finish(Shutdown)
//!     └─► timeout(grace, worker):
//!            ├─ joined      → publish(AllStoppedWithin)
//!            └─ timeout     → abort worker, finish(Aborted), publish(GraceExceeded)
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use flexqueue::{Engine, EngineHandle, HandlerError, HandlerFn, HandlerRef, StopMode, WorkItem};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handler: HandlerRef<String> = HandlerFn::arc(
//!         "print",
//!         |_ctx: EngineHandle<String>, item: Arc<WorkItem<String>>| async move {
//!             println!("{}", item.payload());
//!             Ok::<_, HandlerError>(())
//!         },
//!     );
//!
//!     let engine = Engine::builder(handler)
//!         .with_tags([1, 2])
//!         .with_stop_mode(StopMode::Automatic)
//!         .build();
//!
//!     let handle = engine.handle();
//!     handle.submit("hello".to_string(), 1)?;
//!     handle.submit_delayed("later".to_string(), 2, Duration::from_millis(10), 2)?;
//!
//!     engine.start()?;
//!     let last = engine.stopped().await;
//!     assert!(last.is_some());
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::core::builder::EngineBuilder;
use crate::core::config::EngineConfig;
use crate::core::handle::EngineHandle;
use crate::core::shared::Shared;
use crate::core::state::{EngineState, StopCause};
use crate::core::{shutdown, worker};
use crate::error::{EngineError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::handlers::HandlerRef;
use crate::policies::StopMode;
use crate::queue::{StartId, TagSet};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Subscriber wiring held until `start` (subscriber workers need a runtime).
struct Pending {
    subscribers: Vec<Arc<dyn Subscribe>>,
    events: broadcast::Receiver<Event>,
}

/// Single-worker serialized task engine.
pub struct Engine<P>
where
    P: Send + Sync + 'static,
{
    cfg: EngineConfig,
    shared: Arc<Shared<P>>,
    handler: HandlerRef<P>,
    token: CancellationToken,
    /// Cancelled on drop; ends the subscriber listener.
    closing: CancellationToken,
    pending: Mutex<Option<Pending>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<P> Engine<P>
where
    P: Send + Sync + 'static,
{
    /// Starts building an engine around `handler`.
    pub fn builder(handler: HandlerRef<P>) -> EngineBuilder<P> {
        EngineBuilder::new(handler)
    }

    /// Creates an engine in `Initializing` with no subscribers.
    pub fn new(cfg: EngineConfig, tags: TagSet, mode: StopMode, handler: HandlerRef<P>) -> Self {
        Self::with_subscribers(cfg, tags, mode, handler, Vec::new())
    }

    pub(crate) fn with_subscribers(
        cfg: EngineConfig,
        tags: TagSet,
        mode: StopMode,
        handler: HandlerRef<P>,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let events = bus.subscribe();
        let shared = Arc::new(Shared::new(Arc::from(cfg.name.as_str()), tags, mode, bus));
        Self {
            cfg,
            shared,
            handler,
            token: CancellationToken::new(),
            closing: CancellationToken::new(),
            pending: Mutex::new(Some(Pending {
                subscribers,
                events,
            })),
            worker: Mutex::new(None),
        }
    }

    /// Spawns the worker loop: `Initializing → Running`.
    ///
    /// Must be called inside a tokio runtime. Fails with [`EngineError::AlreadyStarted`]
    /// on a second call and [`EngineError::Stopped`] once the engine stopped.
    pub fn start(&self) -> Result<(), EngineError> {
        if !self.shared.transition(EngineState::Initializing, EngineState::Running) {
            return Err(match self.shared.state() {
                EngineState::Stopped => EngineError::Stopped,
                _ => EngineError::AlreadyStarted,
            });
        }

        if let Some(pending) = self.lock_pending().take() {
            self.subscriber_listener(pending);
        }
        self.shared.publish(self.shared.event(EventKind::EngineStarted));

        let span = tracing::info_span!("worker", engine = %self.shared.name);
        let fut = worker::run(Arc::clone(&self.shared), Arc::clone(&self.handler), self.token.clone());
        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(tokio::spawn(fut.instrument(span)));
        Ok(())
    }

    /// Forwards bus events to the subscriber set (fire-and-forget).
    fn subscriber_listener(&self, pending: Pending) {
        if pending.subscribers.is_empty() {
            return;
        }
        let set = SubscriberSet::new(pending.subscribers, self.shared.bus.clone());
        let mut rx = pending.events;
        let closing = self.closing.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "subscriber listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = closing.cancelled() => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => set.emit(&ev),
                                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
            set.shutdown().await;
        });
    }

    /// A handle for submitting, querying and cancelling work.
    pub fn handle(&self) -> EngineHandle<P> {
        EngineHandle::new(Arc::clone(&self.shared))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.shared.state()
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// A receiver for every event this engine publishes from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Waits until the engine reached `Stopped`; returns the start id passed to `on_stopped`.
    pub async fn stopped(&self) -> Option<StartId> {
        let mut rx = self.shared.state.subscribe();
        // The sender lives in `shared`, which `self` keeps alive.
        let _ = rx.wait_for(|s| *s == EngineState::Stopped).await;
        self.shared.final_start_id()
    }

    /// Stops the engine: interrupts the worker's wait, lets the current handler finish
    /// within [`EngineConfig::grace`], otherwise aborts the worker.
    ///
    /// Returns the start id passed to `on_stopped`. `on_stopped` fires exactly once
    /// across all stop paths.
    pub async fn shutdown(&self) -> Result<Option<StartId>, RuntimeError> {
        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(mut worker) = worker else {
            // Never started, or already joined by an earlier shutdown.
            self.token.cancel();
            self.shared
                .finish(&*self.handler, self.shared.last_start_id(), StopCause::Shutdown);
            return Ok(self.shared.final_start_id());
        };

        self.shared.publish(self.shared.event(EventKind::ShutdownRequested));
        self.token.cancel();

        let grace = self.cfg.grace;
        match tokio::time::timeout(grace, &mut worker).await {
            Ok(_) => {
                self.shared.publish(self.shared.event(EventKind::AllStoppedWithin));
                Ok(self.shared.final_start_id())
            }
            Err(_) => {
                worker.abort();
                self.shared
                    .finish(&*self.handler, self.shared.last_start_id(), StopCause::Aborted);
                self.shared.publish(self.shared.event(EventKind::GraceExceeded));
                tracing::warn!(engine = %self.shared.name, ?grace, "worker aborted after grace period");
                Err(RuntimeError::GraceExceeded { grace })
            }
        }
    }

    /// Starts the engine if needed and runs until it stops on its own or the process
    /// receives a termination signal, then shuts down gracefully.
    pub async fn serve(&self) -> Result<Option<StartId>, RuntimeError> {
        if self.state() == EngineState::Initializing {
            // Lost race with a concurrent start: the worker is running either way.
            let _ = self.start();
        }

        tokio::select! {
            last = self.stopped() => {
                self.join_worker().await;
                Ok(last)
            }
            res = shutdown::wait_for_shutdown_signal() => {
                match res {
                    Ok(signal) => {
                        tracing::info!(engine = %self.shared.name, signal, "termination signal received");
                        self.shutdown().await
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "signal registration failed; waiting for the engine to stop");
                        let last = self.stopped().await;
                        self.join_worker().await;
                        Ok(last)
                    }
                }
            }
        }
    }

    async fn join_worker(&self) {
        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P> Drop for Engine<P>
where
    P: Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.token.cancel();
        self.closing.cancel();
    }
}
