// tests/runtime_fake_executor.rs

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use assetdag::dag::{Plan, Scheduler};
use assetdag::engine::{
    CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TaskOutcome, TriggerReason,
    TriggerWhileRunningBehaviour,
};
use assetdag::types::AssetGroup;
use assetdag_test_utils::{init_tracing, FakeExecutor};

type TestResult = Result<(), Box<dyn Error>>;

fn trigger(task: &str) -> RuntimeEvent {
    RuntimeEvent::TaskTriggered {
        task: task.to_string(),
        reason: TriggerReason::Manual,
    }
}

fn one_shot(plan: &Plan) -> CoreRuntime {
    CoreRuntime::new(
        Scheduler::from_plan(plan),
        TriggerWhileRunningBehaviour::Queue,
        1,
        RuntimeOptions {
            exit_when_idle: true,
        },
    )
}

#[tokio::test]
async fn build_plan_runs_clean_before_every_transform() -> TestResult {
    init_tracing();

    let plan = Plan::exported("build").ok_or("build plan")?;
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());

    rt_tx.send(trigger("clean")).await?;

    let report = timeout(Duration::from_secs(3), Runtime::new(one_shot(&plan), rt_rx, executor).run())
        .await??;

    let executed = executed.lock().unwrap().clone();
    assert_eq!(executed.len(), 4);
    assert_eq!(executed[0], "clean");
    for task in ["styles", "scripts", "images"] {
        assert!(executed.contains(&task.to_string()), "{task} should have run");
    }
    assert!(!report.has_failures());
    assert_eq!(report.succeeded().len(), 4);
    Ok(())
}

#[tokio::test]
async fn failing_lint_blocks_the_build_step() -> TestResult {
    init_tracing();

    let plan = Plan::exported("js").ok_or("js plan")?;
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone()).failing(["scripts-lint"]);

    rt_tx.send(trigger("scripts-lint")).await?;

    let report = timeout(Duration::from_secs(3), Runtime::new(one_shot(&plan), rt_rx, executor).run())
        .await??;

    assert_eq!(*executed.lock().unwrap(), vec!["scripts-lint".to_string()]);

    let failed = report.failed();
    assert_eq!(failed.len(), 2);
    assert_eq!(failed[0], ("scripts", "blocked by failed task 'scripts-lint'"));
    assert_eq!(failed[1].0, "scripts-lint");
    assert!(report.succeeded().is_empty());
    Ok(())
}

#[tokio::test]
async fn parallel_sibling_still_runs_when_one_branch_fails() -> TestResult {
    init_tracing();

    let plan = Plan::exported("build").ok_or("build plan")?;
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone()).failing(["styles"]);

    rt_tx.send(trigger("clean")).await?;

    let report = timeout(Duration::from_secs(3), Runtime::new(one_shot(&plan), rt_rx, executor).run())
        .await??;

    assert_eq!(executed.lock().unwrap().len(), 4);
    let failed: Vec<&str> = report.failed().into_iter().map(|(t, _)| t).collect();
    assert_eq!(failed, vec!["styles"]);
    Ok(())
}

#[tokio::test]
async fn watch_handler_stays_alive_and_reruns_on_new_triggers() -> TestResult {
    init_tracing();

    let plan = Plan::watch_handler(AssetGroup::Scripts);
    let core = CoreRuntime::new(
        Scheduler::from_plan(&plan),
        TriggerWhileRunningBehaviour::Queue,
        1,
        RuntimeOptions {
            exit_when_idle: false,
        },
    );

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());
    let handle = tokio::spawn(Runtime::new(core, rt_rx, executor).with_label("scripts").run());

    rt_tx.send(trigger("scripts-lint")).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(executed.lock().unwrap().len(), 3);
    assert!(!handle.is_finished(), "watch runtimes never exit on idle");

    rt_tx.send(trigger("scripts-lint")).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        *executed.lock().unwrap(),
        ["scripts-lint", "scripts", "reload", "scripts-lint", "scripts", "reload"]
    );

    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;
    let report = timeout(Duration::from_secs(3), handle).await???;
    assert_eq!(
        report.outcomes.get("reload"),
        Some(&TaskOutcome::Success)
    );
    Ok(())
}
