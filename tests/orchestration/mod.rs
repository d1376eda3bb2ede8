//! Orchestration Integration Tests
//!
//! Batches of real tasks run on a tokio substrate: joins, failure aggregation,
//! dependent chains, fallbacks and the fail-fast policy.

pub mod fail_fast_test;
pub mod fallback_test;
pub mod handler_test;
