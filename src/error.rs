//! Error types used by the slotvisor engine and its callers.
//!
//! This module defines the error enums of the crate:
//!
//! - [`QueueError`] - how a single submission settled when it did not succeed.
//! - [`RuntimeError`] - errors raised by the engine lifecycle (`init`/`shutdown`).
//! - [`LimitMisuse`] - internal slot accounting violations (double release).
//! - [`ConfigError`] - configuration loading failures.
//!
//! Types carry `as_label` helpers producing short stable labels for logs/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::requests::RequestType;

/// # Why a submission did not produce its executor's value.
///
/// `E` is the executor's own error type; [`QueueError::Executor`] forwards it
/// verbatim. Every other variant is produced by the engine itself. Nothing is
/// retried inside the engine: retry policy belongs to the caller.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum QueueError<E> {
    /// The type's queue was already at its soft ceiling at submission time.
    #[error("queue for '{request_type}' is full ({max_queue} waiting)")]
    QueueFull {
        /// Request type that was rejected.
        request_type: RequestType,
        /// Configured ceiling of the type's queue.
        max_queue: usize,
    },

    /// The request waited in the queue longer than its timeout.
    ///
    /// The request never held a slot.
    #[error("timed out after {timeout:?} waiting for a slot")]
    Timeout {
        /// The wait timeout that elapsed.
        timeout: Duration,
    },

    /// The executor ran and returned an error.
    #[error("executor failed: {0}")]
    Executor(E),

    /// The executor panicked. Its slot was still released.
    #[error("executor panicked: {0}")]
    Panicked(String),

    /// The request was cancelled while queued.
    #[error("request cancelled before it started")]
    Cancelled,

    /// The request type is not registered and the engine rejects unknown types.
    #[error("unknown request type '{0}'")]
    UnknownType(RequestType),

    /// The engine is shut down (or shut down while the request was queued).
    #[error("engine is shut down")]
    Shutdown,
}

impl<E> QueueError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use slotvisor::QueueError;
    ///
    /// let err: QueueError<String> = QueueError::Cancelled;
    /// assert_eq!(err.as_label(), "request_cancelled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::QueueFull { .. } => "queue_full",
            QueueError::Timeout { .. } => "queue_timeout",
            QueueError::Executor(_) => "executor_failed",
            QueueError::Panicked(_) => "executor_panicked",
            QueueError::Cancelled => "request_cancelled",
            QueueError::UnknownType(_) => "unknown_type",
            QueueError::Shutdown => "engine_shutdown",
        }
    }

    /// True if the request was turned away before its executor ever ran.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, QueueError::Executor(_) | QueueError::Panicked(_))
    }

    /// Returns the executor's error, if that is what this is.
    pub fn into_executor_error(self) -> Option<E> {
        match self {
            QueueError::Executor(e) => Some(e),
            _ => None,
        }
    }
}

/// Why a queued request left the queue without running.
///
/// Engine-internal; each job maps it onto its own [`QueueError<E>`].
#[derive(Debug, Clone)]
pub(crate) enum Rejection {
    QueueFull {
        request_type: RequestType,
        max_queue: usize,
    },
    Timeout {
        timeout: Duration,
    },
    Cancelled,
    UnknownType(RequestType),
    Shutdown,
}

impl Rejection {
    /// Human-readable reason, as carried on `RequestRejected` events.
    pub fn describe(&self) -> String {
        QueueError::<std::convert::Infallible>::from(self.clone()).to_string()
    }
}

impl<E> From<Rejection> for QueueError<E> {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::QueueFull {
                request_type,
                max_queue,
            } => QueueError::QueueFull {
                request_type,
                max_queue,
            },
            Rejection::Timeout { timeout } => QueueError::Timeout { timeout },
            Rejection::Cancelled => QueueError::Cancelled,
            Rejection::UnknownType(ty) => QueueError::UnknownType(ty),
            Rejection::Shutdown => QueueError::Shutdown,
        }
    }
}

/// # Slot accounting violation.
///
/// Never expected given the engine's release discipline (every reservation is
/// owned by exactly one guard). Debug builds treat it as fatal; release builds
/// log it and leave the counters untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LimitMisuse {
    /// A slot was released for a type with no active reservation.
    #[error("release without reservation for '{request_type}'")]
    ReleaseWithoutReserve {
        /// Type whose counter would have gone negative.
        request_type: RequestType,
    },

    /// A slot was released for a type the ledger has never seen.
    #[error("release for unregistered type '{request_type}'")]
    UnregisteredType {
        /// The unknown type.
        request_type: RequestType,
    },
}

impl LimitMisuse {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LimitMisuse::ReleaseWithoutReserve { .. } => "limit_release_without_reserve",
            LimitMisuse::UnregisteredType { .. } => "limit_unregistered_type",
        }
    }
}

/// # Errors produced by the engine lifecycle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// `init()` was called more than once.
    #[error("engine already started")]
    AlreadyStarted,

    /// The engine was built outside a Tokio runtime and no handle was supplied.
    #[error("no tokio runtime available")]
    NoRuntime,

    /// Shutdown grace period was exceeded; some executors were still running.
    #[error("shutdown timeout {grace:?} exceeded; still running: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// `type=active` entries for types that still had running executors.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use slotvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyStarted => "runtime_already_started",
            RuntimeError::NoRuntime => "runtime_missing",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config text is not valid TOML for [`Config`](crate::Config).
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
