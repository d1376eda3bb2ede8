#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! # Tasker Fan-Out
//!
//! Parallel task orchestration for request-handling flows made of independent,
//! I/O-bound sub-operations.
//!
//! ## Overview
//!
//! A request handler that performs several lookups, verifications and fetches
//! one after another pays the sum of their latencies. When those operations do
//! not depend on each other's results they can run concurrently over one shared
//! request context, bringing the latency down to that of the slowest one.
//!
//! This crate provides that primitive:
//!
//! - run N independent [`Task`]s concurrently over a shared context and wait for
//!   all of them ([`FanOutCoordinator`])
//! - report **every** failure of the batch, each attributed to its task, rather
//!   than only the first one ([`ReportableError`])
//! - express true dependencies inside a batch with [`Task::then`], and optional
//!   recovery with [`Task::with_fallback`]
//! - run on an explicitly injected [`ExecutionSubstrate`] instead of an implicit
//!   global pool
//!
//! ## Module Organization
//!
//! - [`orchestration`] - tasks, runner, coordinator, chains, fallbacks, aggregation
//! - [`execution`] - execution substrate abstraction and the tokio implementation
//! - [`config`] - YAML and environment configuration
//! - [`logging`] - tracing subscriber setup
//! - [`error`] - setup errors
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tasker_fanout::{FanOutCoordinator, Slot, Task, TokioSubstrate};
//!
//! #[derive(Debug, Default)]
//! struct Request {
//!     region: Slot<String>,
//!     identity_verified: Slot<bool>,
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
//!     Task::new("verify_identity", |_ctx: Arc<Request>| async move {
//!         Err::<(), _>(anyhow::anyhow!("unauthorized"))
//!     }),
//! ];
//!
//! let error = coordinator
//!     .process_in_parallel(Arc::new(Request::default()), tasks)
//!     .await
//!     .unwrap_err();
//! assert_eq!(error.task_names(), vec!["verify_identity"]);
//! # });
//! ```

pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod orchestration;

pub use config::{ConfigLoader, ConfigurationError, FanOutConfig, SubstrateConfig, SubstrateKind};
pub use error::{FanOutError, Result};
pub use execution::{ExecutionSubstrate, SubstrateError, TokioSubstrate};
pub use orchestration::{
    aggregate, chain, AggregateFailure, BatchReport, FailureCause, FailureKind, FailurePolicy,
    FanOutCoordinator, Outcome, ReportableError, Slot, Task, TaskFailure, TaskHandler, TaskRunner,
};
