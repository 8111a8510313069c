// src/engine/core.rs

//! Synchronous decision core of the runtime.
//!
//! Given one [`RuntimeEvent`], [`CoreRuntime::step`] updates the scheduler,
//! the trigger queue and the report, and answers with [`CoreCommand`](crate::engine::CoreCommand)s for
//! the async shell to carry out. Tests drive it directly.

use tracing::warn;

use crate::dag::Scheduler;
use crate::engine::event_handlers::{handle_task_completion, handle_task_trigger, CoreStep};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RunReport, RuntimeEvent, RuntimeOptions, TaskName, TaskOutcome};
use crate::types::TriggerWhileRunningBehaviour;

/// Reason recorded for nodes a shutdown cut short.
pub const INTERRUPTED: &str = "interrupted before completion";

/// Scheduler, queue and report of one graph. No channels, no IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    queue: TriggerQueue,
    options: RuntimeOptions,
    report: RunReport,
}

impl CoreRuntime {
    pub fn new(
        scheduler: Scheduler,
        behaviour: TriggerWhileRunningBehaviour,
        queue_length: usize,
        options: RuntimeOptions,
    ) -> Self {
        let queue = TriggerQueue::new(behaviour, queue_length);
        Self {
            scheduler,
            queue,
            options,
            report: RunReport::default(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// No follow-up run is waiting.
    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn into_report(self) -> RunReport {
        self.report
    }

    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => {
                handle_task_trigger(&mut self.scheduler, &mut self.queue, task, reason)
            }
            RuntimeEvent::TaskCompleted { task, outcome } => handle_task_completion(
                &mut self.scheduler,
                &mut self.queue,
                &self.options,
                &mut self.report,
                task,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => {
                self.record_interrupted();
                CoreStep::stop()
            }
        }
    }

    /// Every node without an outcome, except those that only end by being
    /// stopped, counts as failed.
    fn record_interrupted(&mut self) {
        let graph = self.scheduler.graph();
        let unfinished: Vec<TaskName> = graph
            .tasks()
            .filter(|task| !self.report.outcomes.contains_key(*task))
            .filter(|task| graph.kind_of(task).is_some_and(|kind| !kind.runs_until_stopped()))
            .map(str::to_string)
            .collect();

        for task in unfinished {
            warn!(task = %task, "{INTERRUPTED}");
            self.report.record(&task, TaskOutcome::Failed(INTERRUPTED.to_string()));
        }
    }
}
