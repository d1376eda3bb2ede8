//! # Fan-Out Coordinator
//!
//! Dispatches a batch of independent tasks to an [`ExecutionSubstrate`] all at
//! once, waits until every one of them has settled, and reports the complete
//! outcome.
//!
//! ## Contract
//!
//! - **Strict join**: `run_all` never returns while a dispatched task is still
//!   pending, under either [`FailurePolicy`].
//! - **Full aggregation**: with the default [`FailurePolicy::CollectAll`] every
//!   task runs to completion and every failure is reported, not just the first.
//! - **No ordering**: tasks start in no particular order and their writes to the
//!   shared context are only guaranteed visible once the batch has joined.
//! - **Empty batch**: returns [`Outcome::AllSucceeded`] without touching the
//!   substrate.
//!
//! The context is shared as `Arc<C>` and never locked by the coordinator.
//! Sibling tasks must write disjoint fields, or synchronise themselves.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use tasker_fanout::execution::TokioSubstrate;
//! use tasker_fanout::orchestration::{FanOutCoordinator, Slot, Task};
//!
//! #[derive(Default)]
//! struct Request {
//!     region: Slot<String>,
//!     profile: Slot<String>,
//! }
//!
//! # tokio_test::block_on(async {
//! let coordinator = FanOutCoordinator::new(Arc::new(TokioSubstrate::current().unwrap()));
//!
//! let tasks = vec![
//!     Task::new("load_region", |ctx: Arc<Request>| async move {
//!         ctx.region.set("eu-west".to_string());
//!         Ok::<_, anyhow::Error>(())
//!     }),
//!     Task::new("fetch_profile", |ctx: Arc<Request>| async move {
//!         ctx.profile.set("alice".to_string());
//!         Ok::<_, anyhow::Error>(())
//!     }),
//! ];
//!
//! let ctx = coordinator
//!     .process_in_parallel(Arc::new(Request::default()), tasks)
//!     .await
//!     .unwrap();
//! assert_eq!(ctx.region.get().as_deref(), Some("eu-west"));
//! assert_eq!(ctx.profile.get().as_deref(), Some("alice"));
//! # });
//! ```

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::aggregator::ReportableError;
use super::failure::TaskFailure;
use super::runner::TaskRunner;
use super::task::{RunScope, Task};
use super::types::{BatchReport, FailurePolicy, Outcome};
use crate::config::{FanOutConfig, SubstrateKind};
use crate::error::Result;
use crate::execution::{Completion, ExecutionSubstrate, TokioSubstrate, Work};

/// Runs batches of independent tasks concurrently over a shared context
#[derive(Debug, Clone)]
pub struct FanOutCoordinator {
    substrate: Arc<dyn ExecutionSubstrate>,
    config: FanOutConfig,
    /// Limits how many of this coordinator's tasks hold a worker at once
    concurrency: Option<Arc<Semaphore>>,
}

impl FanOutCoordinator {
    /// Coordinator with the default configuration: collect all failures, no
    /// concurrency limit beyond the substrate's, no default timeout
    pub fn new(substrate: Arc<dyn ExecutionSubstrate>) -> Self {
        Self {
            substrate,
            config: FanOutConfig::default(),
            concurrency: None,
        }
    }

    /// Coordinator with an explicit configuration; the configuration's
    /// substrate section is ignored in favour of `substrate`
    pub fn with_config(substrate: Arc<dyn ExecutionSubstrate>, config: FanOutConfig) -> Result<Self> {
        config.validate()?;
        let concurrency = config
            .max_concurrent_tasks
            .map(|limit| Arc::new(Semaphore::new(limit)));
        Ok(Self {
            substrate,
            config,
            concurrency,
        })
    }

    /// Build the substrate described by `config` and a coordinator over it.
    ///
    /// A shared substrate must be created from within a tokio runtime.
    pub fn from_config(config: FanOutConfig) -> Result<Self> {
        config.validate()?;
        let substrate = match config.substrate.kind {
            SubstrateKind::Shared => TokioSubstrate::current()?,
            SubstrateKind::Dedicated => TokioSubstrate::dedicated(
                config.substrate.effective_worker_threads(),
                &config.substrate.thread_name,
            )?,
        };
        Self::with_config(Arc::new(substrate), config)
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn config(&self) -> &FanOutConfig {
        &self.config
    }

    pub fn substrate(&self) -> &Arc<dyn ExecutionSubstrate> {
        &self.substrate
    }

    /// Run every task concurrently and return the joined outcome
    pub async fn run_all<C>(&self, tasks: Vec<Task<C>>, context: Arc<C>) -> Outcome
    where
        C: Send + Sync + 'static,
    {
        self.run_batch(tasks, context).await.outcome
    }

    /// Run the tasks and return the mutated context, or an error describing
    /// every task that failed
    pub async fn process_in_parallel<C>(
        &self,
        context: Arc<C>,
        tasks: Vec<Task<C>>,
    ) -> std::result::Result<Arc<C>, ReportableError>
    where
        C: Send + Sync + 'static,
    {
        self.run_all(tasks, context.clone())
            .await
            .into_result()
            .map(|()| context)
    }

    /// Run every task concurrently and return a detailed report of the batch
    #[instrument(
        skip(self, tasks, context),
        fields(
            run_id = tracing::field::Empty,
            task_count = tasks.len(),
            policy = %self.config.failure_policy,
            substrate = %self.substrate.name()
        )
    )]
    pub async fn run_batch<C>(&self, tasks: Vec<Task<C>>, context: Arc<C>) -> BatchReport
    where
        C: Send + Sync + 'static,
    {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        if tasks.is_empty() {
            debug!("Empty batch, nothing to dispatch");
            return BatchReport::empty(run_id);
        }

        let started = Instant::now();
        let total = tasks.len();
        let cancel = CancellationToken::new();
        let default_timeout = self.config.default_task_timeout();

        let mut pending: FuturesUnordered<_> = tasks
            .into_iter()
            .map(|task| {
                let name = task.name().to_string();
                let work = self.prepare(task, context.clone(), cancel.clone(), default_timeout);
                let completion: Completion = self.substrate.submit(work);
                completion.map(move |result| (name, result))
            })
            .collect();

        debug!(task_count = total, "Batch dispatched");

        let mut failures: Vec<TaskFailure> = Vec::new();
        let mut cancelled: Vec<String> = Vec::new();
        let mut succeeded = 0;

        while let Some((name, result)) = pending.next().await {
            let failure = match result {
                Ok(Ok(())) => {
                    succeeded += 1;
                    continue;
                }
                Ok(Err(failure)) if failure.cause.is_cancelled() => {
                    cancelled.push(failure.task_name);
                    continue;
                }
                Ok(Err(failure)) => failure,
                Err(substrate_error) => {
                    warn!(task_name = %name, error = %substrate_error, "Substrate lost task");
                    TaskFailure::substrate(name, substrate_error.to_string())
                }
            };

            if self.config.failure_policy == FailurePolicy::FailFast && !cancel.is_cancelled() {
                info!(
                    task_name = %failure.task_name,
                    "Task failed under fail-fast policy, cancelling siblings"
                );
                cancel.cancel();
            }
            failures.push(failure);
        }

        let elapsed = started.elapsed();
        let report = BatchReport {
            run_id,
            total,
            succeeded,
            cancelled,
            elapsed,
            outcome: Outcome::from_failures(failures),
        };

        info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed(),
            cancelled = report.cancelled.len(),
            duration_ms = elapsed.as_millis() as u64,
            "Batch completed"
        );

        report
    }

    /// Wrap a task into a unit of work: wait for a concurrency permit, run it
    /// with failure isolation, and stop early if the batch is cancelled.
    /// A cancelled task settles only once its blocking closures have returned.
    fn prepare<C>(
        &self,
        task: Task<C>,
        context: Arc<C>,
        cancel: CancellationToken,
        default_timeout: Option<std::time::Duration>,
    ) -> Work
    where
        C: Send + Sync + 'static,
    {
        let concurrency = self.concurrency.clone();
        async move {
            let name = task.name().to_string();
            let scope = RunScope::new(default_timeout);
            let execution_scope = scope.clone();
            let execution = async move {
                let _permit = match concurrency {
                    Some(semaphore) => match semaphore.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(e) => {
                            return Err(TaskFailure::substrate(
                                task.name().to_string(),
                                format!("concurrency limiter closed: {e}"),
                            ))
                        }
                    },
                    None => None,
                };
                TaskRunner::execute_in(task, context, execution_scope).await
            };

            let finished = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = execution => Some(result),
            };

            match finished {
                Some(result) => result,
                None => {
                    // blocking closures outlive the dropped task body
                    scope.settle().await;
                    debug!(task_name = %name, "Task cancelled");
                    Err(TaskFailure::cancelled(name))
                }
            }
        }
        .boxed()
    }
}
