//! # Task Runner
//!
//! Runs a single [`Task`] and guarantees that whatever happens inside it comes
//! back as a value: returned errors, panics and elapsed timeouts are all turned
//! into a [`TaskFailure`]. Nothing a task does can unwind into the worker that
//! runs it or into the sibling tasks of its batch.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use super::failure::TaskFailure;
use super::task::{RunScope, Task, TaskError};

/// Executes tasks with failure isolation
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskRunner;

impl TaskRunner {
    /// Execute `task` against `context`.
    ///
    /// The task's own timeout wins over `default_timeout`. Composite tasks
    /// (chains, fallbacks) are not bounded as a whole by the default; they pass
    /// it on to each task they run.
    pub async fn execute<C, T>(
        task: Task<C, T>,
        context: Arc<C>,
        default_timeout: Option<Duration>,
    ) -> Result<T, TaskFailure>
    where
        C: Send + Sync + 'static,
        T: Send + 'static,
    {
        Self::execute_in(task, context, RunScope::new(default_timeout)).await
    }

    /// Execute `task` as part of an enclosing execution, sharing its scope
    pub(crate) async fn execute_in<C, T>(
        task: Task<C, T>,
        context: Arc<C>,
        scope: RunScope,
    ) -> Result<T, TaskFailure>
    where
        C: Send + Sync + 'static,
        T: Send + 'static,
    {
        let default_timeout = scope.default_timeout;
        let Task {
            name,
            timeout,
            composite,
            op,
        } = task;

        let limit = match (timeout, composite) {
            (Some(explicit), _) => Some(explicit),
            (None, false) => default_timeout,
            (None, true) => None,
        };

        debug!(task_name = %name, timeout_ms = limit.map(|d| d.as_millis() as u64), "Starting task");
        let started = Instant::now();

        // defer the op call into the guarded future so a panic while building
        // the task's future is caught as well
        let inner_scope = scope.clone();
        let guarded = AssertUnwindSafe(async move { op(context, inner_scope).await }).catch_unwind();

        let result = match limit {
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(result) => result,
                Err(_) => {
                    scope.settle().await;
                    error!(
                        task_name = %name,
                        timeout_ms = limit.as_millis() as u64,
                        "Task timed out"
                    );
                    return Err(TaskFailure::timed_out(name, limit));
                }
            },
            None => guarded.await,
        };

        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(value)) => {
                debug!(task_name = %name, duration_ms, "Task completed");
                Ok(value)
            }
            Ok(Err(TaskError::Cause(cause))) => {
                warn!(
                    task_name = %name,
                    error = %cause,
                    duration_ms,
                    "Task failed"
                );
                Err(TaskFailure::new(name, cause))
            }
            // already logged by the runner of the inner task
            Ok(Err(TaskError::Attributed(failure))) => Err(failure),
            Err(panic) => {
                let panic_msg = panic_message(panic.as_ref());
                error!(
                    task_name = %name,
                    panic_msg = %panic_msg,
                    duration_ms,
                    "Task panicked"
                );
                Err(TaskFailure::panicked(name, panic_msg))
            }
        }
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
