//! Handler abstraction.
//!
//! - [`Handler`]    the trait the worker invokes once per item, plus lifecycle hooks
//! - [`HandlerFn`]  closure-backed implementation
//! - [`HandlerRef`] shared handle (`Arc<dyn Handler<P>>`)
//! - [`HandlerFault`] what `on_handler_fault` receives

mod handler;
mod handler_fn;

pub use handler::{Handler, HandlerFault, HandlerRef};
pub use handler_fn::HandlerFn;
