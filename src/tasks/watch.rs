// src/tasks/watch.rs

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::dag::{Plan, Scheduler};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::exec::PipelineExecutor;
use crate::tasks::TaskContext;
use crate::watch::{build_group_profiles, spawn_watcher, GroupRoute};

/// Watch every asset group and re-run its handler graph on change.
///
/// Each group gets its own runtime, so groups run independently while a
/// change within one group is queued behind its running graph. Never
/// completes on its own; dropping the future stops the watcher and aborts
/// the group runtimes.
pub async fn run(ctx: &Arc<TaskContext>) -> Result<()> {
    let cfg = ctx.config.clone();
    let mut runtimes = JoinSet::new();
    let mut routes = Vec::new();

    for profile in build_group_profiles(&cfg)? {
        let group = profile.group();
        let scheduler = Scheduler::from_plan(&Plan::watch_handler(group));
        let roots = scheduler.graph().roots();

        let (runtime_tx, runtime_rx) = mpsc::channel::<RuntimeEvent>(64);
        let executor = PipelineExecutor::new(ctx.clone(), runtime_tx.clone());
        let core = CoreRuntime::new(
            scheduler,
            cfg.watch.triggered_while_running_behaviour,
            cfg.watch.queue_length,
            RuntimeOptions {
                exit_when_idle: false,
            },
        );
        let runtime = Runtime::new(core, runtime_rx, executor).with_label(group.as_str());

        runtimes.spawn(async move {
            if let Err(err) = runtime.run().await {
                error!(%group, "watch runtime stopped: {err}");
            }
        });

        info!(%group, glob = profile.glob().pattern(), "watching");
        routes.push(GroupRoute {
            profile,
            roots,
            runtime_tx,
        });
    }

    let _watcher = spawn_watcher(cfg.root().to_path_buf(), routes)?;
    std::future::pending().await
}
