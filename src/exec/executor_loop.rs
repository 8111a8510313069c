// src/exec/executor_loop.rs

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskName};
use crate::exec::task_runner::run_task;
use crate::tasks::TaskContext;

const DISPATCH_BUFFER: usize = 32;

/// Nodes currently executing, keyed by name. The sender stops a node early;
/// nothing else interrupts one.
#[derive(Default)]
struct InFlight {
    nodes: HashMap<TaskName, (oneshot::Sender<()>, JoinHandle<()>)>,
}

impl InFlight {
    fn launch(
        &mut self,
        task: ScheduledTask,
        ctx: Arc<TaskContext>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) {
        self.nodes.retain(|_, (_, handle)| !handle.is_finished());

        let name = task.name.clone();
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(run_task(task, ctx, runtime_tx, stop_rx));

        // A node comes back only in a later run, after it has reported.
        if self.nodes.insert(name.clone(), (stop_tx, handle)).is_some() {
            debug!(task = %name, "previous instance still winding down");
        }
    }

    fn cancel_all(&mut self) {
        for (name, (stop, handle)) in self.nodes.drain() {
            if !handle.is_finished() {
                info!(task = %name, "stopping running task");
                let _ = stop.send(());
            }
        }
    }
}

/// Start the loop that turns dispatched nodes into tokio tasks.
///
/// Dropping the returned sender cancels whatever is still running.
pub fn spawn_executor(
    ctx: Arc<TaskContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(DISPATCH_BUFFER);

    tokio::spawn(async move {
        let mut in_flight = InFlight::default();
        while let Some(task) = rx.recv().await {
            in_flight.launch(task, ctx.clone(), runtime_tx.clone());
        }
        in_flight.cancel_all();
        debug!("executor loop finished");
    });

    tx
}
