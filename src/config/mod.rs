//! # Fan-Out Configuration
//!
//! Settings for the fan-out coordinator and the execution substrate it runs on.
//! Configuration comes from a YAML file with optional per-environment override
//! sections, then from `TASKER_FANOUT_*` environment variables; see
//! [`ConfigLoader`].
//!
//! ```yaml
//! failure_policy: collect_all
//! max_concurrent_tasks: 16
//! default_task_timeout_ms: 5000
//! substrate:
//!   kind: shared
//!
//! production:
//!   substrate:
//!     kind: dedicated
//!     worker_threads: 8
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::orchestration::types::FailurePolicy;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Root configuration for the fan-out coordinator
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FanOutConfig {
    /// Reaction to the first failed task in a batch
    pub failure_policy: FailurePolicy,

    /// Upper bound on tasks of one coordinator holding a worker at once;
    /// `None` leaves scheduling entirely to the substrate
    pub max_concurrent_tasks: Option<usize>,

    /// Timeout applied to tasks that do not set their own
    pub default_task_timeout_ms: Option<u64>,

    /// Execution substrate selection
    pub substrate: SubstrateConfig,
}

impl FanOutConfig {
    pub fn default_task_timeout(&self) -> Option<Duration> {
        self.default_task_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrent_tasks == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "max_concurrent_tasks",
                "must be greater than 0",
            ));
        }
        if self.default_task_timeout_ms == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "default_task_timeout_ms",
                "must be greater than 0",
            ));
        }
        self.substrate.validate()
    }
}

/// Which runtime executes fan-out work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstrateKind {
    /// The tokio runtime the coordinator is created on
    #[default]
    Shared,
    /// A private runtime owned by the coordinator's substrate
    Dedicated,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SubstrateConfig {
    pub kind: SubstrateKind,
    /// Worker threads of a dedicated runtime; defaults to available parallelism
    pub worker_threads: Option<usize>,
    /// Thread name of a dedicated runtime
    pub thread_name: String,
}

impl Default for SubstrateConfig {
    fn default() -> Self {
        Self {
            kind: SubstrateKind::Shared,
            worker_threads: None,
            thread_name: "tasker-fanout".to_string(),
        }
    }
}

impl SubstrateConfig {
    pub fn effective_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.worker_threads == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "substrate.worker_threads",
                "must be greater than 0",
            ));
        }
        if self.thread_name.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "substrate.thread_name",
                "must not be empty",
            ));
        }
        Ok(())
    }
}
