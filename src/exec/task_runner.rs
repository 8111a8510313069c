// src/exec/task_runner.rs

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::tasks::{self, TaskContext};

/// Execute one node and report its outcome to the runtime.
///
/// A stop signal, or a dropped stop sender, abandons the node without
/// reporting.
pub async fn run_task(
    task: ScheduledTask,
    ctx: Arc<TaskContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let started = Instant::now();

    tokio::select! {
        result = tasks::execute(task.kind, &ctx) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            let outcome = match result {
                Ok(()) => {
                    info!(task = %task.name, run_id = task.run_id, elapsed_ms, "task finished");
                    TaskOutcome::Success
                }
                Err(err) => {
                    let reason = format!("{err:#}");
                    error!(task = %task.name, run_id = task.run_id, elapsed_ms, "task failed: {reason}");
                    TaskOutcome::Failed(reason)
                }
            };

            if runtime_tx
                .send(RuntimeEvent::TaskCompleted {
                    task: task.name.clone(),
                    outcome,
                })
                .await
                .is_err()
            {
                debug!(task = %task.name, run_id = task.run_id, "runtime gone; dropping completion");
            }
        }

        _ = &mut stop_rx => {
            info!(task = %task.name, run_id = task.run_id, "task cancelled");
        }
    }
}
