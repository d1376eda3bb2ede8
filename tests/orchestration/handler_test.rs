use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tasker_fanout::{FailureKind, Task, TaskHandler};

use crate::common::{coordinator, RequestContext};

struct RegionLookup {
    region: &'static str,
}

#[async_trait]
impl TaskHandler<RequestContext> for RegionLookup {
    fn name(&self) -> &str {
        "region_lookup"
    }

    async fn handle(&self, context: &RequestContext) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        context.region.set(self.region.to_string());
        Ok(())
    }
}

struct IdentityCheck {
    authorized: bool,
}

#[async_trait]
impl TaskHandler<RequestContext> for IdentityCheck {
    fn name(&self) -> &str {
        "identity_check"
    }

    async fn handle(&self, context: &RequestContext) -> anyhow::Result<()> {
        if !self.authorized {
            anyhow::bail!("identity rejected");
        }
        context.identity.set("verified".to_string());
        Ok(())
    }
}

/// Handler that hangs unless bounded by its own timeout
struct StuckProfileService;

#[async_trait]
impl TaskHandler<RequestContext> for StuckProfileService {
    fn name(&self) -> &str {
        "profile_service"
    }

    async fn handle(&self, context: &RequestContext) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        context.profile.set("late".to_string());
        Ok(())
    }

    fn timeout(&self) -> Option<Duration> {
        Some(Duration::from_millis(20))
    }
}

#[tokio::test]
async fn test_handlers_run_as_tasks() {
    let tasks = vec![
        Task::from_handler(Arc::new(RegionLookup { region: "ap-south" })),
        Task::from_handler(Arc::new(IdentityCheck { authorized: true })),
    ];

    let ctx = coordinator()
        .process_in_parallel(RequestContext::shared(), tasks)
        .await
        .expect("both handlers succeed");

    assert_eq!(ctx.region.get().as_deref(), Some("ap-south"));
    assert_eq!(ctx.identity.get().as_deref(), Some("verified"));
}

#[tokio::test]
async fn test_handler_failure_is_attributed_to_handler_name() {
    let tasks = vec![
        Task::from_handler(Arc::new(RegionLookup { region: "ap-south" })),
        Task::from_handler(Arc::new(IdentityCheck { authorized: false })),
    ];

    let error = coordinator()
        .process_in_parallel(RequestContext::shared(), tasks)
        .await
        .unwrap_err();

    let failure = error.failure_for("identity_check").expect("attributed");
    assert_eq!(failure.cause.to_string(), "identity rejected");
    assert_eq!(failure.kind(), FailureKind::Error);
}

#[tokio::test(start_paused = true)]
async fn test_handler_timeout_bounds_the_task() {
    let handler: Arc<dyn TaskHandler<RequestContext>> = Arc::new(StuckProfileService);
    let task = Task::from_handler(handler);
    assert_eq!(task.name(), "profile_service");
    assert_eq!(task.timeout(), Some(Duration::from_millis(20)));

    let ctx = RequestContext::shared();
    let outcome = coordinator().run_all(vec![task], ctx.clone()).await;

    let failures = outcome.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].cause.is_timeout());
    assert!(!ctx.profile.is_set());
}

#[tokio::test]
async fn test_handlers_mix_with_closure_tasks() {
    let tasks = vec![
        Task::from_handler(Arc::new(RegionLookup { region: "eu-west" })),
        Task::new("fetch_contract", |ctx: Arc<RequestContext>| async move {
            ctx.contract.set("c-1".to_string());
            Ok::<_, anyhow::Error>(())
        }),
    ];

    let outcome = coordinator()
        .run_all(tasks, RequestContext::shared())
        .await;
    assert!(outcome.is_success());
}
