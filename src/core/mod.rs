//! Runtime core: the engine, its handle and the worker loop.
//!
//! Internal modules:
//! - [`worker`]: the single sequential loop (wait, dispatch, stop policy, drain);
//! - [`runner`]: handles one item with panic isolation and event publishing;
//! - [`shared`]: state shared by the engine, handles and worker; the single path to `Stopped`;
//! - [`shutdown`]: OS termination signals for `serve`.

mod builder;
mod config;
mod engine;
mod handle;
mod runner;
mod shared;
mod shutdown;
mod state;
mod worker;

pub use builder::EngineBuilder;
pub use config::EngineConfig;
pub use engine::Engine;
pub use handle::EngineHandle;
pub use state::EngineState;
