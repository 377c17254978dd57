//! Stop and retry policies.
//!
//! ## Contents
//! - [`StopMode`]      whether the engine stops on its own (automatic) or on request (manual)
//! - [`BackoffPolicy`] how long to wait before a delayed retry of attempt `n`
//! - [`JitterPolicy`]  randomization applied to backoff delays
//!
//! ## Quick wiring
//! ```text
//! Engine::builder(handler).with_stop_mode(StopMode)
//!      └─► core::worker consults stop::safe_to_stop after each regular item
//!
//! EngineHandle::retry(payload, tag, attempt, &BackoffPolicy, start_id)
//!      └─► submit_delayed(payload, tag, backoff.delay_for(attempt), start_id)
//! ```

mod backoff;
mod jitter;
mod stop;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use stop::StopMode;
pub(crate) use stop::{PendingView, safe_to_stop};
