//! Crate-level error type.
//!
//! Setup problems (configuration, substrate) are raised directly. A batch's task
//! failures are reported through [`Outcome`](crate::orchestration::Outcome) and
//! [`ReportableError`]; the `Orchestration` variant lets callers that load
//! configuration and run a batch in one function propagate both with `?`.

use thiserror::Error;

use crate::config::ConfigurationError;
use crate::execution::SubstrateError;
use crate::orchestration::ReportableError;

#[derive(Debug, Error)]
pub enum FanOutError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Execution substrate error: {0}")]
    Substrate(#[from] SubstrateError),

    #[error("Orchestration failed: {0}")]
    Orchestration(#[from] ReportableError),
}

pub type Result<T> = std::result::Result<T, FanOutError>;
