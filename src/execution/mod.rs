//! # Execution
//!
//! The concurrency mechanism fan-out work is delegated to. The coordinator only
//! submits work and awaits completion; see [`ExecutionSubstrate`].

pub mod substrate;

pub use substrate::{Completion, ExecutionSubstrate, SubstrateError, TokioSubstrate, Work};
