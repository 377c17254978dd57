//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(EngineHandle<P>, Arc<WorkItem<P>>) -> Fut`,
//! producing a fresh future per item. Shared state goes in an `Arc` captured by the closure.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use flexqueue::{EngineHandle, HandlerError, HandlerFn, HandlerRef, WorkItem};
//!
//! let h: HandlerRef<u32> = HandlerFn::arc(
//!     "sum",
//!     |_ctx: EngineHandle<u32>, item: Arc<WorkItem<u32>>| async move {
//!         let _ = item.payload() + 1;
//!         Ok::<_, HandlerError>(())
//!     },
//! );
//! assert_eq!(h.name(), "sum");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::EngineHandle;
use crate::error::HandlerError;
use crate::handlers::Handler;
use crate::queue::WorkItem;

/// Function-backed handler implementation.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<P, F, Fut> Handler<P> for HandlerFn<F>
where
    P: Send + Sync + 'static,
    F: Fn(EngineHandle<P>, Arc<WorkItem<P>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, ctx: EngineHandle<P>, item: Arc<WorkItem<P>>) -> Result<(), HandlerError> {
        (self.f)(ctx, item).await
    }
}
