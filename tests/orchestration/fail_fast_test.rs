use std::time::Duration;
use tasker_fanout::{FailurePolicy, Outcome, Task};

use crate::common::{coordinator, fails, writes, Field, RequestContext};

#[tokio::test]
async fn test_fail_fast_cancels_slow_siblings() {
    let ctx = RequestContext::shared();
    let tasks = vec![
        fails("verify_identity", "unauthorized", Duration::from_millis(10)),
        writes("fetch_contract", Field::Contract, "c-42", Duration::from_secs(5)),
        writes("load_region", Field::Region, "eu-west", Duration::from_secs(5)),
    ];

    let report = coordinator()
        .with_policy(FailurePolicy::FailFast)
        .run_batch(tasks, ctx.clone())
        .await;

    // cancelled siblings are not reported as failures
    assert_eq!(report.outcome.failed_task_names(), vec!["verify_identity"]);
    let mut cancelled = report.cancelled.clone();
    cancelled.sort_unstable();
    assert_eq!(cancelled, vec!["fetch_contract", "load_region"]);
    assert_eq!(report.succeeded, 0);
    assert!(report.is_settled());

    assert!(!ctx.contract.is_set());
    assert!(!ctx.region.is_set());
    assert!(report.elapsed < Duration::from_secs(5));
}

#[tokio::test]
async fn test_fail_fast_keeps_work_finished_before_failure() {
    let ctx = RequestContext::shared();
    let tasks = vec![
        writes("load_region", Field::Region, "eu-west", Duration::from_millis(5)),
        fails("verify_identity", "unauthorized", Duration::from_millis(50)),
        writes("fetch_contract", Field::Contract, "c-42", Duration::from_secs(5)),
    ];

    let report = coordinator()
        .with_policy(FailurePolicy::FailFast)
        .run_batch(tasks, ctx.clone())
        .await;

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.cancelled, vec!["fetch_contract"]);
    assert_eq!(ctx.region.get().as_deref(), Some("eu-west"));
}

#[tokio::test]
async fn test_collect_all_lets_slow_siblings_finish() {
    let ctx = RequestContext::shared();
    let tasks = vec![
        fails("verify_identity", "unauthorized", Duration::from_millis(5)),
        writes("fetch_contract", Field::Contract, "c-42", Duration::from_millis(60)),
    ];

    let report = coordinator().run_batch(tasks, ctx.clone()).await;

    assert!(report.cancelled.is_empty());
    assert_eq!(report.succeeded, 1);
    assert_eq!(ctx.contract.get().as_deref(), Some("c-42"));
    assert_eq!(ctx.completed(), 2);
}

#[tokio::test]
async fn test_fail_fast_without_failures_runs_everything() {
    let ctx = RequestContext::shared();
    let tasks = vec![
        writes("load_region", Field::Region, "eu-west", Duration::from_millis(5)),
        writes("fetch_contract", Field::Contract, "c-42", Duration::from_millis(20)),
    ];

    let outcome = coordinator()
        .with_policy(FailurePolicy::FailFast)
        .run_all(tasks, ctx.clone())
        .await;

    assert!(matches!(outcome, Outcome::AllSucceeded));
    assert_eq!(ctx.completed(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_blocking_sibling_settles_before_join() {
    let ctx = RequestContext::shared();
    let tasks = vec![
        fails("verify_identity", "unauthorized", Duration::from_millis(40)),
        Task::blocking("fetch_contract", |ctx: &RequestContext| {
            std::thread::sleep(Duration::from_millis(150));
            ctx.contract.set("c-42".to_string());
            Ok::<_, anyhow::Error>(())
        }),
    ];

    let report = coordinator()
        .with_policy(FailurePolicy::FailFast)
        .run_batch(tasks, ctx.clone())
        .await;

    assert_eq!(report.outcome.failed_task_names(), vec!["verify_identity"]);
    assert_eq!(report.cancelled, vec!["fetch_contract"]);

    // the blocking closure could not be interrupted, but it finished before the join
    let at_return = ctx.contract.get();
    assert_eq!(at_return.as_deref(), Some("c-42"));
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(ctx.contract.get(), at_return);
}
