//! # Orchestration
//!
//! Parallel task orchestration over a shared request context.
//!
//! ## Components
//!
//! - **Task**: a named unit of work over the shared context ([`Task`])
//! - **TaskRunner**: runs one task and captures any error, panic or timeout as a
//!   [`TaskFailure`] ([`TaskRunner`])
//! - **FanOutCoordinator**: dispatches a batch of independent tasks at once and
//!   joins them into an [`Outcome`] ([`FanOutCoordinator`])
//! - **Dependent chains**: a task whose output builds the next task
//!   ([`Task::then`], [`chain`])
//! - **Fallbacks**: recovery instead of failure ([`Task::with_fallback`])
//! - **Failure aggregation**: one [`ReportableError`] per failed run
//!   ([`aggregate`])
//!
//! ## Flow
//!
//! ```text
//! caller ──tasks + Arc<ctx>──▶ FanOutCoordinator ──submit──▶ ExecutionSubstrate
//!                                   │                          │ (TaskRunner per task)
//!                                   ◀──────── completions ─────┘
//!                                   │ join all
//!                                   ▼
//!                      Outcome ──aggregate──▶ Result<Arc<ctx>, ReportableError>
//! ```

pub mod aggregator;
pub mod chain;
pub mod context;
pub mod coordinator;
pub mod failure;
pub mod fallback;
pub mod handler;
pub mod runner;
pub mod task;
pub mod types;

pub use aggregator::{aggregate, AggregateFailure, ReportableError};
pub use chain::chain;
pub use context::Slot;
pub use coordinator::FanOutCoordinator;
pub use failure::{FailureCause, FailureKind, FailureSummary, TaskFailure};
pub use handler::TaskHandler;
pub use runner::TaskRunner;
pub use task::Task;
pub use types::{BatchReport, FailurePolicy, Outcome};
