//! # Engine builder.
//!
//! [`EngineBuilder`] collects the tag set, stop mode, configuration and subscribers, then
//! builds an [`Engine`] in `Initializing`.

use std::sync::Arc;

use crate::core::config::EngineConfig;
use crate::core::engine::Engine;
use crate::handlers::HandlerRef;
use crate::policies::StopMode;
use crate::queue::{Tag, TagSet};
use crate::subscribers::Subscribe;

/// Builder for constructing an [`Engine`].
///
/// Defaults: empty tag set, [`StopMode::Automatic`], [`EngineConfig::default`], no subscribers.
pub struct EngineBuilder<P>
where
    P: Send + Sync + 'static,
{
    handler: HandlerRef<P>,
    tags: TagSet,
    mode: StopMode,
    cfg: EngineConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<P> EngineBuilder<P>
where
    P: Send + Sync + 'static,
{
    /// Creates a new builder around `handler`.
    pub fn new(handler: HandlerRef<P>) -> Self {
        Self {
            handler,
            tags: TagSet::default(),
            mode: StopMode::default(),
            cfg: EngineConfig::default(),
            subscribers: Vec::new(),
        }
    }

    /// Sets the closed set of tags accepted for delayed items.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Sets the stop mode.
    pub fn with_stop_mode(mut self, mode: StopMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the runtime configuration.
    pub fn with_config(mut self, cfg: EngineConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive engine events through dedicated workers with bounded queues,
    /// starting with events published before [`Engine::start`] (up to the bus capacity).
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the engine in `Initializing`.
    pub fn build(self) -> Engine<P> {
        Engine::with_subscribers(self.cfg, self.tags, self.mode, self.handler, self.subscribers)
    }
}
