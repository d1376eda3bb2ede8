use std::sync::Arc;
use std::time::Duration;
use tasker_fanout::{FailureKind, FanOutConfig, FanOutCoordinator, Task, TokioSubstrate};

use crate::common::{coordinator, fails, writes, Field, RequestContext};

const STEP: Duration = Duration::from_millis(10);

#[tokio::test]
async fn test_fallback_turns_failure_into_success() {
    let ctx = RequestContext::shared();
    let tasks = vec![
        writes("load_region", Field::Region, "eu-west", STEP),
        fails("fetch_profile", "profile service down", STEP).with_fallback(|failure, ctx| {
            assert_eq!(failure.task_name, "fetch_profile");
            ctx.profile.set("anonymous".to_string());
        }),
    ];

    let ctx = coordinator()
        .process_in_parallel(ctx, tasks)
        .await
        .expect("fallback absorbs the failure");

    assert_eq!(ctx.profile.get().as_deref(), Some("anonymous"));
    assert_eq!(ctx.region.get().as_deref(), Some("eu-west"));
}

#[tokio::test]
async fn test_fallback_is_not_invoked_on_success() {
    let ctx = RequestContext::shared();
    let tasks = vec![writes("fetch_profile", Field::Profile, "alice", STEP)
        .with_fallback(|_, ctx| ctx.profile.set("anonymous".to_string()))];

    let outcome = coordinator().run_all(tasks, ctx.clone()).await;

    assert!(outcome.is_success());
    assert_eq!(ctx.profile.get().as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_unprotected_failures_are_still_reported() {
    let ctx = RequestContext::shared();
    let tasks = vec![
        fails("fetch_profile", "profile service down", STEP)
            .with_fallback(|_, ctx| ctx.profile.set("anonymous".to_string())),
        fails("verify_identity", "unauthorized", STEP),
    ];

    let outcome = coordinator().run_all(tasks, ctx.clone()).await;

    assert_eq!(outcome.failed_task_names(), vec!["verify_identity"]);
    assert_eq!(ctx.profile.get().as_deref(), Some("anonymous"));
}

#[tokio::test]
async fn test_recover_substitutes_value_for_continuation() {
    let ctx = RequestContext::shared();
    let lookup: Task<RequestContext, u64> = Task::new(
        "lookup_customer",
        |_: Arc<RequestContext>| async move { Err::<u64, _>(anyhow::anyhow!("cache miss")) },
    );

    let tasks = vec![lookup.recover(|_, _| 0).then(|customer_id| {
        writes(
            "fetch_contract",
            Field::Contract,
            &format!("default-contract-{customer_id}"),
            STEP,
        )
    })];

    let outcome = coordinator().run_all(tasks, ctx.clone()).await;

    assert!(outcome.is_success());
    assert_eq!(ctx.contract.get().as_deref(), Some("default-contract-0"));
}

#[tokio::test(start_paused = true)]
async fn test_fallback_recovers_from_default_timeout() {
    let config = FanOutConfig {
        default_task_timeout_ms: Some(50),
        ..Default::default()
    };
    let coordinator =
        FanOutCoordinator::with_config(Arc::new(TokioSubstrate::current().unwrap()), config)
            .unwrap();

    let ctx = RequestContext::shared();
    let tasks = vec![
        writes("fetch_profile", Field::Profile, "alice", Duration::from_secs(10)).with_fallback(
            |failure, ctx| {
                assert_eq!(failure.kind(), FailureKind::Timeout);
                ctx.profile.set("cached".to_string());
            },
        ),
    ];

    let outcome = coordinator.run_all(tasks, ctx.clone()).await;

    assert!(outcome.is_success());
    assert_eq!(ctx.profile.get().as_deref(), Some("cached"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timed_out_blocking_task_cannot_overwrite_fallback() {
    let ctx = RequestContext::shared();
    let tasks = vec![
        Task::blocking("fetch_profile", |ctx: &RequestContext| {
            std::thread::sleep(Duration::from_millis(200));
            ctx.profile.set("stale".to_string());
            Ok::<_, anyhow::Error>(())
        })
        .with_timeout(Duration::from_millis(20))
        .with_fallback(|failure, ctx| {
            assert_eq!(failure.kind(), FailureKind::Timeout);
            ctx.profile.set("cached".to_string());
        }),
        writes("load_region", Field::Region, "eu-west", STEP),
    ];

    let ctx = coordinator()
        .process_in_parallel(ctx, tasks)
        .await
        .expect("fallback absorbs the timeout");

    let at_return = ctx.profile.get();
    assert_eq!(at_return.as_deref(), Some("cached"));

    // nothing from the batch is still running
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(ctx.profile.get(), at_return);
}
