//! # Tasks
//!
//! A [`Task`] is one named unit of work against a shared context. It is built
//! fresh for every orchestration run and consumed when it runs, so it never
//! carries state from one request to the next.
//!
//! Tasks are created from an async closure ([`Task::new`]), a blocking closure
//! ([`Task::blocking`]), or a [`TaskHandler`](super::handler::TaskHandler)
//! implementation ([`Task::from_handler`]), and composed with
//! [`Task::then`] and [`Task::with_fallback`].

use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;

use super::failure::{FailureCause, TaskFailure};
use super::handler::TaskHandler;
use super::runner::TaskRunner;

/// Error produced inside a task body, before the runner attributes it
pub(crate) enum TaskError {
    /// The task's own failure; the runner attaches the task name
    Cause(FailureCause),
    /// A failure already attributed to an inner task of a composite
    Attributed(TaskFailure),
}

pub(crate) type TaskFuture<T> = BoxFuture<'static, Result<T, TaskError>>;

/// Body of a task. Receives the shared context and the scope of the execution
/// it belongs to, which composite tasks forward to each of their inner tasks.
pub(crate) type TaskOp<C, T> = Box<dyn FnOnce(Arc<C>, RunScope) -> TaskFuture<T> + Send>;

/// State shared by one top-level task execution and every task nested in it
#[derive(Clone)]
pub(crate) struct RunScope {
    /// Batch default timeout
    pub(crate) default_timeout: Option<Duration>,
    /// Blocking closures started anywhere in this task tree
    blocking: TaskTracker,
}

impl RunScope {
    pub(crate) fn new(default_timeout: Option<Duration>) -> Self {
        Self {
            default_timeout,
            blocking: TaskTracker::new(),
        }
    }

    /// Wait until every blocking closure of this task tree has returned.
    ///
    /// A blocking thread cannot be interrupted, so a timed-out or cancelled task
    /// is only reported once nothing it started can still touch the context.
    pub(crate) async fn settle(&self) {
        self.blocking.close();
        self.blocking.wait().await;
        self.blocking.reopen();
    }
}

/// A named unit of work over a shared context `C`, producing `T` on success
pub struct Task<C, T = ()> {
    pub(crate) name: String,
    pub(crate) timeout: Option<Duration>,
    /// Composite tasks bound their inner tasks individually and are not
    /// subject to the batch default timeout as a whole
    pub(crate) composite: bool,
    pub(crate) op: TaskOp<C, T>,
}

impl<C, T> Task<C, T>
where
    C: Send + Sync + 'static,
    T: Send + 'static,
{
    /// Create a task from an async closure over the shared context.
    ///
    /// Any error returned by the closure becomes a [`TaskFailure`] carrying this
    /// task's name.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use tasker_fanout::orchestration::{Slot, Task};
    ///
    /// #[derive(Default)]
    /// struct Request {
    ///     region: Slot<String>,
    /// }
    ///
    /// # tokio_test::block_on(async {
    /// let task = Task::new("load_region", |ctx: Arc<Request>| async move {
    ///     ctx.region.set("eu-west".to_string());
    ///     Ok::<_, anyhow::Error>(())
    /// });
    ///
    /// let ctx = Arc::new(Request::default());
    /// task.run(ctx.clone()).await.unwrap();
    /// assert_eq!(ctx.region.get().as_deref(), Some("eu-west"));
    /// # });
    /// ```
    pub fn new<F, Fut, E>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(Arc<C>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<anyhow::Error>,
    {
        Self::from_op(name, false, move |ctx, _| {
            async move {
                f(ctx)
                    .await
                    .map_err(|e| TaskError::Cause(FailureCause::Error(e.into())))
            }
            .boxed()
        })
    }

    /// Create a task from a blocking closure.
    ///
    /// The closure runs on the runtime's blocking thread pool so that blocking
    /// I/O never occupies an async worker. The thread cannot be interrupted: a
    /// timeout or fail-fast cancellation is reported once the closure returns,
    /// so the closure never writes to the context after its batch has joined.
    pub fn blocking<F, E>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(&C) -> Result<T, E> + Send + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        Self::from_op(name, false, move |ctx, scope| {
            async move {
                match scope.blocking.spawn_blocking(move || f(&ctx)).await {
                    Ok(result) => result.map_err(|e| TaskError::Cause(FailureCause::Error(e.into()))),
                    // re-raise so the runner reports it like any other panic
                    Err(join_error) if join_error.is_panic() => {
                        std::panic::resume_unwind(join_error.into_panic())
                    }
                    Err(join_error) => Err(TaskError::Cause(FailureCause::Substrate(
                        join_error.to_string(),
                    ))),
                }
            }
            .boxed()
        })
    }

    /// A task that succeeds immediately with `value`
    pub fn succeed(name: impl Into<String>, value: T) -> Self {
        Self::from_op(name, false, move |_, _| async move { Ok(value) }.boxed())
    }

    /// A task that fails immediately with `error`
    pub fn fail(name: impl Into<String>, error: impl Into<anyhow::Error>) -> Self {
        let error = error.into();
        Self::from_op(name, false, move |_, _| {
            async move { Err(TaskError::Cause(FailureCause::Error(error))) }.boxed()
        })
    }

    pub(crate) fn from_op<F>(name: impl Into<String>, composite: bool, op: F) -> Self
    where
        F: FnOnce(Arc<C>, RunScope) -> TaskFuture<T> + Send + 'static,
    {
        Self {
            name: name.into(),
            timeout: None,
            composite,
            op: Box::new(op),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Bound this task's execution time; overrides the batch default
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Run this task on the current task, outside any batch.
    ///
    /// Errors, panics and timeouts are returned as a [`TaskFailure`].
    pub async fn run(self, context: Arc<C>) -> Result<T, TaskFailure> {
        TaskRunner::execute(self, context, None).await
    }
}

impl<C> Task<C, ()>
where
    C: Send + Sync + 'static,
{
    /// Wrap a [`TaskHandler`] supplied by the surrounding application
    pub fn from_handler(handler: Arc<dyn TaskHandler<C>>) -> Self {
        let name = handler.name().to_string();
        let timeout = handler.timeout();
        let mut task = Self::from_op(name, false, move |ctx, _| {
            async move {
                handler
                    .handle(&ctx)
                    .await
                    .map_err(|e| TaskError::Cause(FailureCause::Error(e)))
            }
            .boxed()
        });
        task.timeout = timeout;
        task
    }
}

impl<C, T> fmt::Debug for Task<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("composite", &self.composite)
            .finish_non_exhaustive()
    }
}
