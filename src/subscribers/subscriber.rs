//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for observing engine events (logging, metrics,
//! test probes). Each subscriber gets its own bounded queue and worker task inside
//! [`SubscriberSet`](crate::SubscriberSet), so a slow or panicking subscriber never
//! touches the engine's worker loop.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use flexqueue::{Event, EventKind, Subscribe};
//!
//! struct FaultCounter;
//!
//! #[async_trait]
//! impl Subscribe for FaultCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::HandlerFault {
//!             // bump a counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "fault-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally. Panics are caught and published as `SubscriberPanicked`.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event (FIFO per subscriber).
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity for this subscriber (clamped to at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
