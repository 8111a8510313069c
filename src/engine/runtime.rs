// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RunReport, RuntimeEvent};

/// Async shell around [`CoreRuntime`]: pulls events off the channel and
/// hands dispatched nodes to the executor.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    label: String,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("label", &self.label)
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            label: "main".to_string(),
        }
    }

    /// Name used in log lines; watch groups each run their own runtime.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Drive the core until it asks to exit, shutdown is requested, or every
    /// sender is gone. Returns the outcome of every node that finished.
    pub async fn run(mut self) -> Result<RunReport> {
        info!(runtime = %self.label, "runtime started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(runtime = %self.label, ?event, "event");
            let step = self.core.step(event);

            for command in step.commands {
                self.apply(command).await?;
            }
            if !step.keep_running {
                info!(runtime = %self.label, "runtime finished");
                return Ok(self.core.into_report());
            }
        }

        info!(runtime = %self.label, "event channel closed");
        Ok(self.core.into_report())
    }

    async fn apply(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) if tasks.is_empty() => Ok(()),
            CoreCommand::DispatchTasks(tasks) => {
                let dispatched: Vec<(&str, u64)> =
                    tasks.iter().map(|t| (t.name.as_str(), t.run_id)).collect();
                debug!(runtime = %self.label, ?dispatched, "dispatching");
                self.executor.dispatch(tasks).await
            }
            CoreCommand::RequestExit => Ok(()),
        }
    }
}
