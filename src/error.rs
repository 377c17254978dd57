//! Error types used by the flexqueue engine and its handlers.
//!
//! This module defines three enums:
//!
//! - [`EngineError`]: synchronous usage errors returned to the caller (bad tag, late submission).
//! - [`HandlerError`]: failures of a single handler invocation, reported out-of-band.
//! - [`RuntimeError`]: failures of the engine runtime itself (shutdown exceeding its grace).
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::queue::Tag;

/// # Errors returned synchronously by engine operations.
///
/// These never reach the handler; they describe a misuse of the queue at call time.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// The tag is not part of the engine's [`TagSet`](crate::TagSet); nothing was enqueued.
    #[error("tag {tag} is not in the engine tag set")]
    InvalidTag {
        /// The rejected tag.
        tag: Tag,
    },

    /// The engine already reached `Stopped`; the submission was rejected.
    #[error("engine is stopped; submission rejected")]
    Stopped,

    /// [`Engine::start`](crate::Engine::start) was called more than once.
    #[error("engine worker already started")]
    AlreadyStarted,
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use flexqueue::EngineError;
    ///
    /// assert_eq!(EngineError::InvalidTag { tag: 5 }.as_label(), "engine_invalid_tag");
    /// assert_eq!(EngineError::Stopped.as_label(), "engine_stopped");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::InvalidTag { .. } => "engine_invalid_tag",
            EngineError::Stopped => "engine_stopped",
            EngineError::AlreadyStarted => "engine_already_started",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            EngineError::InvalidTag { tag } => format!("invalid tag: {tag}"),
            EngineError::Stopped => "submission after stop".to_string(),
            EngineError::AlreadyStarted => "worker already started".to_string(),
        }
    }
}

/// # Errors produced by a single handler invocation.
///
/// A handler error is isolated to the item that produced it: the engine reports it through
/// [`Handler::on_handler_fault`](crate::Handler::on_handler_fault) and an
/// [`EventKind::HandlerFault`](crate::EventKind::HandlerFault) event, then moves on.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("handler failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The handler panicked; the panic was caught on the worker.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        HandlerError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use flexqueue::HandlerError;
    ///
    /// assert_eq!(HandlerError::fail("boom").as_label(), "handler_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Fail { error } => format!("error: {error}"),
            HandlerError::Panicked { info } => format!("panic: {info}"),
        }
    }
}

/// # Errors produced by the engine runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The worker did not exit within the grace period and was aborted.
    #[error("shutdown timeout {grace:?} exceeded; worker aborted")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace } => {
                format!("grace exceeded after {grace:?}; worker aborted")
            }
        }
    }
}
