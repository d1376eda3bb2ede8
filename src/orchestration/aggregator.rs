//! # Failure Aggregation
//!
//! Converts the failures collected from one orchestration run into a single
//! reportable error without discarding which task failed or why.
//!
//! The rule is deterministic:
//!
//! - no failures: no error ([`aggregate`] returns `None`)
//! - exactly one failure: [`ReportableError::Single`] wraps it directly, so its
//!   display and `source()` chain are those of the original failure
//! - several failures: [`ReportableError::Composite`] keeps every member
//!   individually inspectable

use serde_json::json;
use std::fmt;
use thiserror::Error;

use super::failure::{FailureSummary, TaskFailure};

/// Every failure observed in one orchestration run
#[derive(Debug)]
pub struct AggregateFailure {
    failures: Vec<TaskFailure>,
}

impl AggregateFailure {
    pub fn failures(&self) -> &[TaskFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<TaskFailure> {
        self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.task_name.as_str()).collect()
    }

    /// Failure of the named task, if it is part of this aggregate
    pub fn get(&self, task_name: &str) -> Option<&TaskFailure> {
        self.failures.iter().find(|f| f.task_name == task_name)
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tasks failed: ", self.failures.len())?;
        for (index, failure) in self.failures.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} ({})", failure.task_name, failure.cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateFailure {}

/// Error surfaced to the caller when an orchestration run did not fully succeed
#[derive(Debug, Error)]
pub enum ReportableError {
    /// Exactly one task failed
    #[error(transparent)]
    Single(TaskFailure),

    /// Two or more tasks failed
    #[error(transparent)]
    Composite(AggregateFailure),
}

impl ReportableError {
    pub fn failures(&self) -> &[TaskFailure] {
        match self {
            ReportableError::Single(failure) => std::slice::from_ref(failure),
            ReportableError::Composite(aggregate) => aggregate.failures(),
        }
    }

    pub fn into_failures(self) -> Vec<TaskFailure> {
        match self {
            ReportableError::Single(failure) => vec![failure],
            ReportableError::Composite(aggregate) => aggregate.into_failures(),
        }
    }

    pub fn len(&self) -> usize {
        self.failures().len()
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, ReportableError::Composite(_))
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.failures()
            .iter()
            .map(|f| f.task_name.as_str())
            .collect()
    }

    /// Failure of the named task, if it is part of this error
    pub fn failure_for(&self, task_name: &str) -> Option<&TaskFailure> {
        self.failures().iter().find(|f| f.task_name == task_name)
    }

    /// JSON report listing every failed task
    pub fn to_json(&self) -> serde_json::Value {
        let failures: Vec<FailureSummary> =
            self.failures().iter().map(TaskFailure::summary).collect();
        json!({
            "error": if self.is_composite() { "aggregate_failure" } else { "task_failure" },
            "failed_count": failures.len(),
            "failures": failures,
        })
    }
}

/// Fold the failures of one run into a [`ReportableError`].
///
/// Returns `None` when there is nothing to report.
pub fn aggregate(mut failures: Vec<TaskFailure>) -> Option<ReportableError> {
    match failures.len() {
        0 => None,
        1 => failures.pop().map(ReportableError::Single),
        _ => Some(ReportableError::Composite(AggregateFailure { failures })),
    }
}
