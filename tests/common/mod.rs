//! Shared helpers for fan-out integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use futures::FutureExt;
use tasker_fanout::execution::{
    Completion, ExecutionSubstrate, SubstrateError, TokioSubstrate, Work,
};
use tasker_fanout::{FanOutCoordinator, Slot, Task};

/// Request context resembling the one a request handler populates
#[derive(Debug, Default)]
pub struct RequestContext {
    pub region: Slot<String>,
    pub identity: Slot<String>,
    pub profile: Slot<String>,
    pub contract: Slot<String>,
    pub customer_id: Slot<u64>,
    pub continuation_calls: AtomicUsize,
    pub completed: AtomicUsize,
}

impl RequestContext {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

/// Field of [`RequestContext`] a test task writes
#[derive(Debug, Clone, Copy)]
pub enum Field {
    Region,
    Identity,
    Profile,
    Contract,
}

impl Field {
    pub fn slot(self, ctx: &RequestContext) -> &Slot<String> {
        match self {
            Field::Region => &ctx.region,
            Field::Identity => &ctx.identity,
            Field::Profile => &ctx.profile,
            Field::Contract => &ctx.contract,
        }
    }
}

/// Task that sleeps for `delay` and then writes `value` into `field`
pub fn writes(name: &str, field: Field, value: &str, delay: Duration) -> Task<RequestContext> {
    let value = value.to_string();
    Task::new(name, move |ctx: Arc<RequestContext>| async move {
        tokio::time::sleep(delay).await;
        field.slot(&ctx).set(value);
        ctx.completed.fetch_add(1, Ordering::SeqCst);
        Ok::<_, anyhow::Error>(())
    })
}

/// Task that sleeps for `delay` and then fails with `message`
pub fn fails(name: &str, message: &str, delay: Duration) -> Task<RequestContext> {
    let message = message.to_string();
    Task::new(name, move |ctx: Arc<RequestContext>| async move {
        tokio::time::sleep(delay).await;
        ctx.completed.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(anyhow::anyhow!(message))
    })
}

pub fn coordinator() -> FanOutCoordinator {
    FanOutCoordinator::new(Arc::new(
        TokioSubstrate::current().expect("tests run inside a tokio runtime"),
    ))
}

/// Substrate that counts submissions before delegating to tokio
#[derive(Debug)]
pub struct CountingSubstrate {
    inner: TokioSubstrate,
    submitted: Arc<AtomicUsize>,
}

impl CountingSubstrate {
    pub fn new() -> Self {
        Self {
            inner: TokioSubstrate::current().expect("tests run inside a tokio runtime"),
            submitted: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }
}

impl ExecutionSubstrate for CountingSubstrate {
    fn name(&self) -> &str {
        "counting"
    }

    fn submit(&self, work: Work) -> Completion {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        self.inner.submit(work)
    }
}

/// Substrate that drops the `lose_at`-th submission (0-based) and reports it
/// as cancelled, delegating every other one to tokio
#[derive(Debug)]
pub struct LossySubstrate {
    inner: TokioSubstrate,
    lose_at: usize,
    submitted: AtomicUsize,
}

impl LossySubstrate {
    pub fn new(lose_at: usize) -> Self {
        Self {
            inner: TokioSubstrate::current().expect("tests run inside a tokio runtime"),
            lose_at,
            submitted: AtomicUsize::new(0),
        }
    }
}

impl ExecutionSubstrate for LossySubstrate {
    fn name(&self) -> &str {
        "lossy"
    }

    fn submit(&self, work: Work) -> Completion {
        if self.submitted.fetch_add(1, Ordering::SeqCst) == self.lose_at {
            drop(work);
            return async { Err(SubstrateError::Cancelled) }.boxed();
        }
        self.inner.submit(work)
    }
}
