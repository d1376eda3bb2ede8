//! # Execution Substrate
//!
//! The coordinator depends on nothing but "submit a unit of work, be told when
//! it completes". [`ExecutionSubstrate`] is that seam; [`TokioSubstrate`] is the
//! implementation backed by a tokio runtime, either the ambient one or a
//! private runtime owned by the substrate.
//!
//! Substrates are injected into the coordinator explicitly. A dedicated
//! substrate keeps fan-out work from contending with unrelated workloads on a
//! process-wide pool.

use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use thiserror::Error;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::info;

use crate::orchestration::failure::TaskFailure;
use crate::orchestration::runner::panic_message;

/// A unit of work handed to the substrate. It has already been wrapped by the
/// task runner, so its own failures arrive as values.
pub type Work = BoxFuture<'static, Result<(), TaskFailure>>;

/// Completion notification for a submitted unit of work
pub type Completion = BoxFuture<'static, Result<Result<(), TaskFailure>, SubstrateError>>;

/// Errors raised by the substrate itself rather than by the work it runs
#[derive(Debug, Error)]
pub enum SubstrateError {
    #[error("no tokio runtime is available on this thread")]
    NoRuntime,

    #[error("failed to build runtime: {0}")]
    RuntimeBuild(String),

    #[error("work panicked outside the task runner: {0}")]
    Panicked(String),

    #[error("work was cancelled before completion (runtime shutting down)")]
    Cancelled,
}

/// Something that can run work concurrently and report its completion
pub trait ExecutionSubstrate: Send + Sync + fmt::Debug {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Start `work` and return a future that resolves when it completes.
    ///
    /// The work must begin executing without the returned future being polled.
    fn submit(&self, work: Work) -> Completion;
}

/// Tokio-backed substrate
#[derive(Debug)]
pub struct TokioSubstrate {
    name: String,
    handle: Handle,
    /// Present only for dedicated substrates
    runtime: Option<Runtime>,
}

impl TokioSubstrate {
    /// Use the runtime of the calling context (the shared pool)
    pub fn current() -> Result<Self, SubstrateError> {
        let handle = Handle::try_current().map_err(|_| SubstrateError::NoRuntime)?;
        Ok(Self::with_handle(handle))
    }

    /// Use the runtime behind `handle`
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            name: "tokio-shared".to_string(),
            handle,
            runtime: None,
        }
    }

    /// Build a private multi-threaded runtime owned by this substrate.
    ///
    /// The runtime is shut down in the background when the substrate is dropped.
    pub fn dedicated(worker_threads: usize, thread_name: &str) -> Result<Self, SubstrateError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name(thread_name)
            .enable_all()
            .build()
            .map_err(|e| SubstrateError::RuntimeBuild(e.to_string()))?;

        info!(
            worker_threads = worker_threads.max(1),
            thread_name = %thread_name,
            "Dedicated fan-out runtime started"
        );

        Ok(Self {
            name: format!("tokio-dedicated:{thread_name}"),
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn is_dedicated(&self) -> bool {
        self.runtime.is_some()
    }
}

impl ExecutionSubstrate for TokioSubstrate {
    fn name(&self) -> &str {
        &self.name
    }

    fn submit(&self, work: Work) -> Completion {
        let join_handle = self.handle.spawn(work);
        async move {
            join_handle.await.map_err(|join_error| {
                if join_error.is_panic() {
                    SubstrateError::Panicked(panic_message(join_error.into_panic().as_ref()))
                } else {
                    SubstrateError::Cancelled
                }
            })
        }
        .boxed()
    }
}

impl Drop for TokioSubstrate {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            // safe to call from async contexts, unlike dropping the runtime
            runtime.shutdown_background();
        }
    }
}
