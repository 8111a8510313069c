// src/exec/backend.rs

//! Where dispatched nodes go. Production runs them against the task context;
//! integration tests plug in a fake that answers with canned outcomes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};
use crate::tasks::TaskContext;

use super::executor_loop::spawn_executor;

/// Receives ready nodes from the runtime. Each accepted node must
/// eventually produce a `TaskCompleted` event on the runtime channel.
pub trait ExecutorBackend: Send {
    fn dispatch(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Executor used in production: forwards dispatched nodes to the background
/// executor loop, which runs the matching task against the shared context.
#[derive(Debug)]
pub struct PipelineExecutor {
    tx: mpsc::Sender<ScheduledTask>,
}

impl PipelineExecutor {
    /// Spawns the background executor loop immediately.
    pub fn new(ctx: Arc<TaskContext>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        let tx = spawn_executor(ctx, runtime_tx);
        Self { tx }
    }
}

impl ExecutorBackend for PipelineExecutor {
    fn dispatch(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();
        Box::pin(async move {
            for task in tasks {
                tx.send(task).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
