//! # The consumer-supplied handler.
//!
//! A [`Handler`] is invoked by the worker once per regular item, never concurrently with
//! itself. Besides [`handle`](Handler::handle) it exposes three hooks the engine calls at
//! well-defined points:
//!
//! ```text
//! item dispatched      ──► handle(ctx, item)
//!                            └─ Err / panic ──► on_handler_fault(&fault)
//! stop request reached ──► on_stop_requested(ctx, start_id, last_tag)   (default: drain)
//! engine Stopped       ──► on_stopped(last_start_id)                    (exactly once)
//! ```
//!
//! The handler receives an [`EngineHandle`] as context, so it may schedule delayed retries
//! of the item it is handling, cancel tags or stop the engine.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::EngineHandle;
use crate::error::HandlerError;
use crate::queue::{StartId, Tag, WorkItem};

/// Shared handle to a handler (`Arc<dyn Handler<P>>`).
pub type HandlerRef<P> = Arc<dyn Handler<P>>;

/// A failed invocation, passed to [`Handler::on_handler_fault`].
pub struct HandlerFault<P> {
    /// What went wrong.
    pub error: HandlerError,
    /// The item whose handling failed.
    pub item: Arc<WorkItem<P>>,
}

/// # Sequential work handler.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use flexqueue::{EngineHandle, Handler, HandlerError, WorkItem};
///
/// struct Upload;
///
/// #[async_trait]
/// impl Handler<String> for Upload {
///     fn name(&self) -> &str { "upload" }
///
///     async fn handle(
///         &self,
///         _ctx: EngineHandle<String>,
///         item: Arc<WorkItem<String>>,
///     ) -> Result<(), HandlerError> {
///         if item.payload().is_empty() {
///             return Err(HandlerError::fail("empty file"));
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<P>: Send + Sync + 'static
where
    P: Send + Sync + 'static,
{
    /// Returns a stable, human-readable handler name.
    fn name(&self) -> &str {
        "handler"
    }

    /// Handles one item. An error is reported out-of-band and does not stop the engine.
    async fn handle(&self, ctx: EngineHandle<P>, item: Arc<WorkItem<P>>) -> Result<(), HandlerError>;

    /// Called on the worker when a stop request submitted with
    /// [`EngineHandle::request_stop`] reaches the head of the queue.
    ///
    /// The default cancels every tag except `last_tag` and stops the engine.
    /// Unlike the automatic stop check, it does not wait for immediate items submitted
    /// after the stop request: those are discarded and reported as `ItemsDiscarded`.
    /// Override this hook to handle them before calling [`EngineHandle::stop_self`].
    /// Overrides must eventually call [`EngineHandle::stop_self`]; until then the engine
    /// stays in `Draining` and keeps handling items. If an override fails, the engine logs
    /// the fault and falls back to the default drain.
    async fn on_stop_requested(
        &self,
        ctx: EngineHandle<P>,
        start_id: StartId,
        last_tag: Option<Tag>,
    ) -> Result<(), HandlerError> {
        let _ = ctx.default_drain(start_id, last_tag);
        Ok(())
    }

    /// Called once after the engine reached `Stopped`.
    fn on_stopped(&self, _last_start_id: Option<StartId>) {}

    /// Called once per failed item.
    fn on_handler_fault(&self, _fault: &HandlerFault<P>) {}
}
