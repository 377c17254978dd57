//! # Run a single item on the worker.
//!
//! ```text
//! publish ItemStarting
//!   └─► handler.handle(ctx, item)   (panics caught)
//!         ├─ Ok(())       → publish ItemCompleted
//!         └─ Err / panic  → publish HandlerFault → handler.on_handler_fault(&fault)
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event: `ItemCompleted` or `HandlerFault`.
//! - A fault never escapes: the worker continues with the next item.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::core::{EngineHandle, shared::Shared};
use crate::error::HandlerError;
use crate::events::EventKind;
use crate::handlers::{Handler, HandlerFault};
use crate::queue::WorkItem;
use crate::subscribers::panic_message;

/// Handles `item` once, reporting the outcome on the bus and to the fault hook.
pub(crate) async fn run_item<P>(
    shared: &Shared<P>,
    handler: &dyn Handler<P>,
    ctx: &EngineHandle<P>,
    item: WorkItem<P>,
) -> Result<(), HandlerError>
where
    P: Send + Sync + 'static,
{
    let item = Arc::new(item);
    shared.set_last_start_id(item.start_id());
    shared.publish(
        shared
            .event(EventKind::ItemStarting)
            .with_tag_opt(item.tag())
            .with_start_id(item.start_id())
            .with_item_seq(item.seq()),
    );

    let res = AssertUnwindSafe(handler.handle(ctx.clone(), Arc::clone(&item)))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(HandlerError::Panicked {
                info: panic_message(&*panic),
            })
        });

    match res {
        Ok(()) => {
            shared.publish(
                shared
                    .event(EventKind::ItemCompleted)
                    .with_tag_opt(item.tag())
                    .with_start_id(item.start_id())
                    .with_item_seq(item.seq()),
            );
            Ok(())
        }
        Err(error) => {
            report_fault(shared, handler, HandlerFault { error: error.clone(), item });
            Err(error)
        }
    }
}

fn report_fault<P>(shared: &Shared<P>, handler: &dyn Handler<P>, fault: HandlerFault<P>)
where
    P: Send + Sync + 'static,
{
    tracing::warn!(
        engine = %shared.name,
        seq = fault.item.seq(),
        start_id = fault.item.start_id(),
        error = %fault.error,
        "handler fault"
    );
    shared.publish(
        shared
            .event(EventKind::HandlerFault)
            .with_tag_opt(fault.item.tag())
            .with_start_id(fault.item.start_id())
            .with_item_seq(fault.item.seq())
            .with_reason(fault.error.to_string()),
    );
    if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| handler.on_handler_fault(&fault))) {
        tracing::warn!(
            engine = %shared.name,
            info = %panic_message(&*panic),
            "on_handler_fault panicked"
        );
    }
}
