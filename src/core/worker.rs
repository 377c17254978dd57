//! # Worker loop: the single sequential execution context.
//!
//! ```text
//! loop:
//!   direct stop requested?                 → finish(Requested)
//!   wait (biased):
//!     ├─ shutdown token cancelled          → finish(Shutdown)
//!     ├─ stop_signal                       → re-check
//!     └─ queue.next_ready()
//!          ├─ Work(item) → run_item
//!          │     └─ Automatic && Running && safe_to_stop (atomic close) → finish(Auto)
//!          ├─ Stop(req)  → Draining, on_stop_requested (fallback: default drain)
//!          └─ closed     → finish(Requested)
//! ```
//!
//! ## Rules
//! - One item at a time; the next wait starts only after the handler returned.
//! - Shutdown interrupts the wait, never a running handler (see `Engine::shutdown` for the
//!   grace/abort path).
//! - The automatic check runs after faulted items too.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::core::runner::run_item;
use crate::core::shared::Shared;
use crate::core::state::{EngineState, StopCause};
use crate::core::EngineHandle;
use crate::error::HandlerError;
use crate::events::EventKind;
use crate::handlers::HandlerRef;
use crate::policies::{StopMode, safe_to_stop};
use crate::queue::{Entry, StopRequest};
use crate::subscribers::panic_message;

/// Runs until the engine reaches `Stopped`.
pub(crate) async fn run<P>(shared: Arc<Shared<P>>, handler: HandlerRef<P>, token: CancellationToken)
where
    P: Send + Sync + 'static,
{
    let ctx = EngineHandle::new(Arc::clone(&shared));
    tracing::debug!(handler = handler.name(), "worker started");

    loop {
        if let Some(start_id) = shared.take_stop_request() {
            shared.finish(&*handler, Some(start_id), StopCause::Requested);
            return;
        }

        let entry = tokio::select! {
            biased;
            _ = token.cancelled() => {
                shared.finish(&*handler, shared.last_start_id(), StopCause::Shutdown);
                return;
            }
            _ = shared.stop_signal.notified() => continue,
            next = shared.queue.next_ready() => next,
        };

        match entry {
            Some(Entry::Work(item)) => {
                let tag = item.tag();
                let start_id = item.start_id();
                let _ = run_item(&shared, &*handler, &ctx, item).await;

                if shared.mode == StopMode::Automatic
                    && shared.state() == EngineState::Running
                    && shared.queue.close_if(|pending| safe_to_stop(&shared.tags, tag, pending))
                {
                    shared.finish(&*handler, Some(start_id), StopCause::Auto);
                    return;
                }
            }
            Some(Entry::Stop(req)) => drain(&shared, &handler, &ctx, req).await,
            None => {
                let last = shared.take_stop_request().or_else(|| shared.last_start_id());
                shared.finish(&*handler, last, StopCause::Requested);
                return;
            }
        }
    }
}

/// Runs the manual-stop protocol for a stop request that reached the head of the queue.
async fn drain<P>(shared: &Shared<P>, handler: &HandlerRef<P>, ctx: &EngineHandle<P>, req: StopRequest)
where
    P: Send + Sync + 'static,
{
    shared.transition(EngineState::Running, EngineState::Draining);
    shared.publish(
        shared
            .event(EventKind::DrainStarted)
            .with_tag_opt(req.last_tag)
            .with_start_id(req.start_id),
    );
    tracing::info!(start_id = req.start_id, last_tag = ?req.last_tag, "draining");

    let res = AssertUnwindSafe(handler.on_stop_requested(ctx.clone(), req.start_id, req.last_tag))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(HandlerError::Panicked {
                info: panic_message(&*panic),
            })
        });

    if let Err(error) = res {
        tracing::warn!(start_id = req.start_id, error = %error, "stop hook failed; applying default drain");
        shared.publish(
            shared
                .event(EventKind::HandlerFault)
                .with_tag_opt(req.last_tag)
                .with_start_id(req.start_id)
                .with_item_seq(req.seq)
                .with_reason(error.to_string()),
        );
        let _ = ctx.default_drain(req.start_id, req.last_tag);
    }
}
