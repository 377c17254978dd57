//! # Engine state machine.
//!
//! ```text
//! Initializing ──start()──► Running ──stop request reached──► Draining
//!       │                      │                                  │
//!       │                      ├── auto-stop / stop_self ─────────┤
//!       │                      │                                  ▼
//!       └──── shutdown() ──────┴──── shutdown() ─────────────► Stopped
//! ```
//!
//! `Stopped` is terminal: the queue is closed and submissions fail with
//! [`EngineError::Stopped`](crate::EngineError::Stopped).

/// Lifecycle state of an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Built, worker not started yet. Submissions are queued.
    Initializing,
    /// Worker running; automatic stop checks active (in automatic mode).
    Running,
    /// Stop request reached the worker; automatic stop checks disabled.
    Draining,
    /// Worker exited; no further items accepted.
    Stopped,
}

impl EngineState {
    /// Returns a short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineState::Initializing => "initializing",
            EngineState::Running => "running",
            EngineState::Draining => "draining",
            EngineState::Stopped => "stopped",
        }
    }
}

/// Why the engine reached `Stopped` (reported as the `EngineStopped` reason).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StopCause {
    /// Automatic policy found nothing left to wait for.
    Auto,
    /// `stop_self` was called (directly or by the drain protocol).
    Requested,
    /// `Engine::shutdown` cancelled the worker.
    Shutdown,
    /// The worker missed the grace period and was aborted.
    Aborted,
}

impl StopCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopCause::Auto => "auto",
            StopCause::Requested => "requested",
            StopCause::Shutdown => "shutdown",
            StopCause::Aborted => "aborted",
        }
    }
}
