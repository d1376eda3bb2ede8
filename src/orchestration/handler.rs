//! # Task Handlers
//!
//! Business operations (region lookups, identity checks, profile fetches) are
//! supplied to the orchestrator as opaque handlers. The orchestrator knows a
//! handler's name and whether it succeeded, nothing more.

use async_trait::async_trait;
use std::time::Duration;

/// An operation the surrounding application plugs into a batch.
///
/// Implementations write their results into the fields of `C` they own.
/// Retrying, if wanted, happens inside `handle` before it reports failure.
#[async_trait]
pub trait TaskHandler<C>: Send + Sync
where
    C: Send + Sync,
{
    /// Name used for diagnostics and failure attribution
    fn name(&self) -> &str;

    /// Perform the operation against the shared context
    async fn handle(&self, context: &C) -> anyhow::Result<()>;

    /// Per-handler timeout; `None` defers to the batch default
    fn timeout(&self) -> Option<Duration> {
        None
    }
}
