//! # Dependent Chains
//!
//! A chain runs a producer task and, only if it succeeds, builds the next task
//! from the producer's output and runs it. The composite is itself a [`Task`],
//! so it can sit in a fan-out batch next to independent tasks; that is how a
//! batch mixes parallel and sequential work without a graph engine.
//!
//! If the producer fails the continuation is never called, and the failure
//! keeps the producer's name.

use futures::FutureExt;
use std::sync::Arc;

use super::runner::TaskRunner;
use super::task::{RunScope, Task, TaskError};

impl<C, T> Task<C, T>
where
    C: Send + Sync + 'static,
    T: Send + 'static,
{
    /// Feed this task's output into the task built by `continuation`.
    ///
    /// The composite is named `"<producer>.then"`; failures of either link keep
    /// the failing link's own name.
    pub fn then<U, F>(self, continuation: F) -> Task<C, U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Task<C, U> + Send + 'static,
    {
        let name = format!("{}.then", self.name);
        Task::<C, U>::from_op(name, true, move |ctx: Arc<C>, scope: RunScope| {
            async move {
                let value = TaskRunner::execute_in(self, ctx.clone(), scope.clone())
                    .await
                    .map_err(TaskError::Attributed)?;
                let next = continuation(value);
                TaskRunner::execute_in(next, ctx, scope)
                    .await
                    .map_err(TaskError::Attributed)
            }
            .boxed()
        })
    }
}

/// Compose `producer` with `continuation`; see [`Task::then`]
pub fn chain<C, T, U, F>(producer: Task<C, T>, continuation: F) -> Task<C, U>
where
    C: Send + Sync + 'static,
    T: Send + 'static,
    U: Send + 'static,
    F: FnOnce(T) -> Task<C, U> + Send + 'static,
{
    producer.then(continuation)
}
