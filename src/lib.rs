// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod images;
pub mod lint;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod tasks;
pub mod transform;
pub mod types;
pub mod watch;

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate, load_or_default};
use crate::config::ConfigFile;
use crate::dag::{DagGraph, Plan, Scheduler, EXPORTED_TASKS};
use crate::engine::{CoreRuntime, RunReport, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use crate::errors::AssetdagError;
use crate::exec::PipelineExecutor;
use crate::fs::RealFileSystem;
use crate::tasks::TaskContext;
use crate::types::AssetGroup;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - task resolution and config loading
/// - scheduler / queue / runtime
/// - executor and task context (filesystem, live reload, dev server)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    if args.list {
        print!("{}", render_task_list());
        return Ok(());
    }

    let plan = resolve_task(&args.task)?;
    let cfg = load_config(&args.config)?;

    if args.dry_run {
        print!("{}", render_dry_run(&args.task, &plan, &cfg)?);
        debug!("dry-run complete (no execution)");
        return Ok(());
    }

    let ctx = Arc::new(TaskContext::new(cfg, Arc::new(RealFileSystem)));
    let report = run_plan(ctx.clone(), &plan).await;
    ctx.server.lock().await.stop().await?;

    into_result(report?)
}

/// Look up an exported task.
pub fn resolve_task(name: &str) -> Result<Plan, AssetdagError> {
    Plan::exported(name).ok_or_else(|| {
        AssetdagError::UnknownTask(format!(
            "'{name}' (expected one of: {})",
            EXPORTED_TASKS.join(", ")
        ))
    })
}

/// A missing file at the default location means built-in defaults; a
/// missing explicit file is an error.
fn load_config(path: &str) -> Result<ConfigFile, AssetdagError> {
    let path = Path::new(path);
    if path == default_config_path() {
        load_or_default(path)
    } else {
        load_and_validate(path)
    }
}

/// Drive `plan` to completion (or until Ctrl-C) and report every outcome.
pub async fn run_plan(ctx: Arc<TaskContext>, plan: &Plan) -> Result<RunReport> {
    let scheduler = Scheduler::from_plan(plan);
    let roots = scheduler.graph().roots();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = PipelineExecutor::new(ctx.clone(), rt_tx.clone());

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for Ctrl-C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    info!(plan = %plan, ?roots, "starting");
    for task in roots {
        rt_tx
            .send(RuntimeEvent::TaskTriggered {
                task,
                reason: TriggerReason::Manual,
            })
            .await?;
    }

    let core = CoreRuntime::new(
        scheduler,
        ctx.config.watch.triggered_while_running_behaviour,
        ctx.config.watch.queue_length,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );
    let report = Runtime::new(core, rt_rx, executor)
        .run()
        .await?;
    Ok(report)
}

/// Turn failed nodes into an error (exit code 1).
pub fn into_result(report: RunReport) -> Result<()> {
    let failed = report.failed();
    if failed.is_empty() {
        info!(succeeded = report.succeeded().len(), "all tasks finished");
        return Ok(());
    }

    let tasks = failed
        .iter()
        .map(|(task, reason)| format!("{task} ({reason})"))
        .collect::<Vec<_>>()
        .join(", ");
    Err(AssetdagError::TasksFailed {
        count: failed.len(),
        tasks,
    }
    .into())
}

/// `--list`: every exported task and its composition.
pub fn render_task_list() -> String {
    let width = EXPORTED_TASKS.iter().map(|n| n.len()).max().unwrap_or(0);
    let mut out = String::new();
    for name in EXPORTED_TASKS {
        if let Some(plan) = Plan::exported(name) {
            let _ = writeln!(out, "{name:<width$}  {plan}");
        }
    }
    out
}

/// `--dry-run`: the resolved graph in execution order plus the paths each
/// group reads and writes.
pub fn render_dry_run(task: &str, plan: &Plan, cfg: &ConfigFile) -> Result<String> {
    let graph = DagGraph::from_plan(plan);
    let order = graph.topological_order()?;
    let mut out = String::new();

    let _ = writeln!(out, "assetdag dry-run: {task}");
    let _ = writeln!(out, "  plan: {plan}");
    let _ = writeln!(out);
    let _ = writeln!(out, "order ({}):", order.len());
    for (i, name) in order.iter().enumerate() {
        let deps = graph.dependencies_of(name);
        if deps.is_empty() {
            let _ = writeln!(out, "  {}. {name}", i + 1);
        } else {
            let _ = writeln!(out, "  {}. {name} (after: {})", i + 1, deps.join(", "));
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "paths:");
    let _ = writeln!(out, "  root: {}", cfg.root().display());
    let _ = writeln!(out, "  output: {}", cfg.output_dir().display());
    for group in AssetGroup::ALL {
        let src = cfg.source_glob(group);
        match (group, cfg.dest_dir(group)) {
            (AssetGroup::Styles, Some(dest)) => {
                let _ = writeln!(out, "  {group}: {src} -> {}", dest.join(cfg.styles.output_name()).display());
            }
            (AssetGroup::Scripts, Some(dest)) => {
                let _ = writeln!(out, "  {group}: {src} -> {}", dest.join(&cfg.scripts.bundle).display());
            }
            (_, Some(dest)) => {
                let _ = writeln!(out, "  {group}: {src} -> {}", dest.display());
            }
            (_, None) => {
                let _ = writeln!(out, "  {group}: {src} (watched only)");
            }
        }
    }
    let _ = writeln!(out, "  maps: {}", cfg.maps_dir().display());
    let _ = writeln!(
        out,
        "  server: http://{}:{} (root {})",
        cfg.server.host,
        cfg.server.port,
        cfg.server_root().display()
    );

    Ok(out)
}
