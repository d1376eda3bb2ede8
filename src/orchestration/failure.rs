//! # Task Failures
//!
//! Every way a task can go wrong (an error returned from its body, a panic, an
//! elapsed timeout, cancellation by a fail-fast batch, or the execution
//! substrate losing the unit of work) is captured at the runner boundary and
//! turned into a [`TaskFailure`]. A failure always carries the name of the task
//! that produced it and the moment it was observed, and the original cause stays
//! reachable through [`std::error::Error::source`] and [`FailureCause::downcast_ref`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Why a single task failed
#[derive(Debug, Error)]
pub enum FailureCause {
    /// The task body returned an error
    #[error(transparent)]
    Error(anyhow::Error),

    /// The task body panicked; the payload message is kept when it is a string
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The task did not finish within its timeout
    #[error("task timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    /// The task was stopped because a sibling failed under the fail-fast policy
    #[error("task cancelled after a sibling task failed")]
    Cancelled,

    /// The execution substrate could not run the task to completion
    #[error("execution substrate error: {0}")]
    Substrate(String),
}

impl FailureCause {
    /// Short machine-readable label used in logs and JSON summaries
    pub fn kind(&self) -> FailureKind {
        match self {
            FailureCause::Error(_) => FailureKind::Error,
            FailureCause::Panicked(_) => FailureKind::Panic,
            FailureCause::TimedOut(_) => FailureKind::Timeout,
            FailureCause::Cancelled => FailureKind::Cancelled,
            FailureCause::Substrate(_) => FailureKind::Substrate,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FailureCause::Cancelled)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FailureCause::TimedOut(_))
    }

    /// Downcast the original error returned by the task body.
    ///
    /// Returns `None` for panics, timeouts, cancellation and substrate errors,
    /// or when the original error is of a different type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            FailureCause::Error(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Category of a [`FailureCause`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Error,
    Panic,
    Timeout,
    Cancelled,
    Substrate,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FailureKind::Error => "error",
            FailureKind::Panic => "panic",
            FailureKind::Timeout => "timeout",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Substrate => "substrate",
        };
        f.write_str(label)
    }
}

/// One task's failure within a single orchestration run.
///
/// A task fails at most once per run, so a batch never holds two failures with
/// the same origin unless the caller gave two tasks the same name.
#[derive(Debug, Error)]
#[error("task '{task_name}' failed: {cause}")]
pub struct TaskFailure {
    /// Name of the task that failed (for a dependent chain, the link that failed)
    pub task_name: String,
    /// Underlying cause
    #[source]
    pub cause: FailureCause,
    /// When the failure was captured
    pub failed_at: DateTime<Utc>,
}

impl TaskFailure {
    pub fn new(task_name: impl Into<String>, cause: FailureCause) -> Self {
        Self {
            task_name: task_name.into(),
            cause,
            failed_at: Utc::now(),
        }
    }

    /// Failure caused by an error returned from the task body
    pub fn error(task_name: impl Into<String>, error: impl Into<anyhow::Error>) -> Self {
        Self::new(task_name, FailureCause::Error(error.into()))
    }

    pub fn panicked(task_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(task_name, FailureCause::Panicked(message.into()))
    }

    pub fn timed_out(task_name: impl Into<String>, after: Duration) -> Self {
        Self::new(task_name, FailureCause::TimedOut(after))
    }

    pub fn cancelled(task_name: impl Into<String>) -> Self {
        Self::new(task_name, FailureCause::Cancelled)
    }

    pub fn substrate(task_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(task_name, FailureCause::Substrate(reason.into()))
    }

    pub fn kind(&self) -> FailureKind {
        self.cause.kind()
    }

    /// Serializable view of this failure for reporting
    pub fn summary(&self) -> FailureSummary {
        FailureSummary {
            task_name: self.task_name.clone(),
            kind: self.kind(),
            message: self.cause.to_string(),
            failed_at: self.failed_at,
        }
    }
}

/// Serializable description of a [`TaskFailure`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSummary {
    pub task_name: String,
    pub kind: FailureKind,
    pub message: String,
    pub failed_at: DateTime<Utc>,
}
