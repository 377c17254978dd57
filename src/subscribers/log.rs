//! # LogWriter: events as `tracing` records.
//!
//! Renders every [`Event`] through `tracing`, at `debug` for routine traffic, `info` for
//! lifecycle changes and `warn` for faults, rejections and overflow. Install any
//! `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG flexqueue::log: queued engine="mailer" seq=4 tag=Some(2) delay_ms=Some(500)
//!  WARN flexqueue::log: handler fault engine="mailer" seq=4 start_id=Some(9) reason="smtp timeout"
//!  INFO flexqueue::log: stopped engine="mailer" last_start_id=Some(9) reason="auto"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let engine = e.engine.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::ItemQueued => tracing::debug!(
                target: "flexqueue::log",
                engine, seq = ?e.item_seq, tag = ?e.tag, delay_ms = ?e.delay_ms,
                "queued"
            ),
            EventKind::ItemStarting => tracing::debug!(
                target: "flexqueue::log",
                engine, seq = ?e.item_seq, tag = ?e.tag, start_id = ?e.start_id,
                "starting"
            ),
            EventKind::ItemCompleted => tracing::debug!(
                target: "flexqueue::log",
                engine, seq = ?e.item_seq, start_id = ?e.start_id,
                "completed"
            ),
            EventKind::HandlerFault => tracing::warn!(
                target: "flexqueue::log",
                engine, seq = ?e.item_seq, start_id = ?e.start_id, reason,
                "handler fault"
            ),
            EventKind::TagCancelled => tracing::debug!(
                target: "flexqueue::log",
                engine, tag = ?e.tag, count = ?e.count,
                "cancelled"
            ),
            EventKind::SubmitRejected => tracing::warn!(
                target: "flexqueue::log",
                engine, tag = ?e.tag, start_id = ?e.start_id, reason,
                "submission rejected"
            ),
            EventKind::EngineStarted => tracing::info!(target: "flexqueue::log", engine, "started"),
            EventKind::StopRequested => tracing::info!(
                target: "flexqueue::log",
                engine, start_id = ?e.start_id, last_tag = ?e.tag,
                "stop requested"
            ),
            EventKind::DrainStarted => tracing::info!(
                target: "flexqueue::log",
                engine, start_id = ?e.start_id, last_tag = ?e.tag,
                "draining"
            ),
            EventKind::EngineStopped => tracing::info!(
                target: "flexqueue::log",
                engine, last_start_id = ?e.start_id, reason,
                "stopped"
            ),
            EventKind::ItemsDiscarded => tracing::warn!(
                target: "flexqueue::log",
                engine, count = ?e.count,
                "discarded pending items at stop"
            ),
            EventKind::ShutdownRequested => {
                tracing::info!(target: "flexqueue::log", engine, "shutdown requested")
            }
            EventKind::AllStoppedWithin => {
                tracing::info!(target: "flexqueue::log", engine, "stopped within grace")
            }
            EventKind::GraceExceeded => {
                tracing::warn!(target: "flexqueue::log", engine, "grace exceeded; worker aborted")
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "flexqueue::log", reason, "subscriber overflow")
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(target: "flexqueue::log", reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
