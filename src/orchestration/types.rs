//! Result types shared by the fan-out coordinator and its callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use super::aggregator::{aggregate, ReportableError};
use super::failure::TaskFailure;

/// How a batch reacts to the first failed task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Let every task finish and report every failure
    #[default]
    CollectAll,
    /// Cancel in-flight siblings once a task fails. Cancelled tasks are listed
    /// in [`BatchReport::cancelled`], not reported as failures.
    FailFast,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::CollectAll => f.write_str("collect_all"),
            FailurePolicy::FailFast => f.write_str("fail_fast"),
        }
    }
}

/// Result of one orchestration run
#[derive(Debug)]
pub enum Outcome {
    AllSucceeded,
    /// Failures in the order their completion was observed. That order varies
    /// between runs.
    Failed(Vec<TaskFailure>),
}

impl Outcome {
    pub(crate) fn from_failures(failures: Vec<TaskFailure>) -> Self {
        if failures.is_empty() {
            Outcome::AllSucceeded
        } else {
            Outcome::Failed(failures)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::AllSucceeded)
    }

    pub fn failures(&self) -> &[TaskFailure] {
        match self {
            Outcome::AllSucceeded => &[],
            Outcome::Failed(failures) => failures,
        }
    }

    pub fn failed_task_names(&self) -> Vec<&str> {
        self.failures()
            .iter()
            .map(|f| f.task_name.as_str())
            .collect()
    }

    /// Convert into a `Result`, aggregating any failures
    pub fn into_result(self) -> Result<(), ReportableError> {
        match self {
            Outcome::AllSucceeded => Ok(()),
            Outcome::Failed(failures) => match aggregate(failures) {
                Some(error) => Err(error),
                None => Ok(()),
            },
        }
    }
}

/// Detailed account of one orchestration run
#[derive(Debug)]
pub struct BatchReport {
    /// Correlation id, also recorded on the run's tracing span
    pub run_id: Uuid,
    pub outcome: Outcome,
    /// Number of tasks submitted
    pub total: usize,
    pub succeeded: usize,
    /// Names of tasks stopped by the fail-fast policy before they finished
    pub cancelled: Vec<String>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub(crate) fn empty(run_id: Uuid) -> Self {
        Self {
            run_id,
            outcome: Outcome::AllSucceeded,
            total: 0,
            succeeded: 0,
            cancelled: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn failed(&self) -> usize {
        self.outcome.failures().len()
    }

    /// Every submitted task is accounted for exactly once
    pub fn is_settled(&self) -> bool {
        self.succeeded + self.failed() + self.cancelled.len() == self.total
    }
}
