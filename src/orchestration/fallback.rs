//! # Fallbacks
//!
//! Orthogonal combinators for callers that want a task to degrade instead of
//! failing its batch. The wrapped task runs normally; if it fails for any reason
//! (error, panic or timeout) the recovery function receives the failure and the
//! shared context and supplies the result instead.
//!
//! Cancellation by a fail-fast batch is not recovered: a cancelled task stays
//! cancelled.

use futures::FutureExt;
use std::sync::Arc;
use tracing::warn;

use super::failure::TaskFailure;
use super::runner::TaskRunner;
use super::task::{RunScope, Task, TaskError};

impl<C, T> Task<C, T>
where
    C: Send + Sync + 'static,
    T: Send + 'static,
{
    /// Replace any failure of this task with the value produced by `recovery`.
    ///
    /// The returned task keeps this task's name and does not fail unless
    /// `recovery` itself panics or the task is cancelled.
    pub fn recover<F>(self, recovery: F) -> Task<C, T>
    where
        F: FnOnce(TaskFailure, &C) -> T + Send + 'static,
    {
        let name = self.name.clone();
        Task::<C, T>::from_op(name, true, move |ctx: Arc<C>, scope: RunScope| {
            async move {
                match TaskRunner::execute_in(self, ctx.clone(), scope).await {
                    Ok(value) => Ok(value),
                    Err(failure) if failure.cause.is_cancelled() => {
                        Err(TaskError::Attributed(failure))
                    }
                    Err(failure) => {
                        warn!(
                            task_name = %failure.task_name,
                            kind = %failure.kind(),
                            error = %failure.cause,
                            "Task failed, applying fallback"
                        );
                        Ok(recovery(failure, &ctx))
                    }
                }
            }
            .boxed()
        })
    }
}

impl<C> Task<C, ()>
where
    C: Send + Sync + 'static,
{
    /// Run `recovery` instead of failing; the returned task never fails
    pub fn with_fallback<F>(self, recovery: F) -> Task<C, ()>
    where
        F: FnOnce(TaskFailure, &C) + Send + 'static,
    {
        self.recover(recovery)
    }
}
