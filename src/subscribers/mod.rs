//! # Event subscribers.
//!
//! [`Subscribe`] is the observer interface; [`SubscriberSet`] fans events out to all
//! subscribers with isolated queues.
//!
//! ```text
//! Worker / EngineHandle ── publish(Event) ──► Bus ──► engine listener ──► SubscriberSet
//!                                                                  ┌─────────┼─────────┐
//!                                                                  ▼         ▼         ▼
//!                                                              LogWriter  Metrics   Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
