// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeSet;

use tracing::debug;

use crate::dag::{ScheduledTask, Scheduler, TaskRunState};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RunReport, RuntimeOptions, TaskName, TaskOutcome, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Request that the process exits (one-shot plans once idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute (send tasks, exit).
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn carry_on() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }

    pub(crate) fn stop() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: false,
        }
    }

    fn dispatch(&mut self, tasks: Vec<ScheduledTask>) {
        if !tasks.is_empty() {
            self.commands.push(CoreCommand::DispatchTasks(tasks));
        }
    }
}

/// Handle a trigger.
///
/// An idle scheduler starts a new run seeded with this trigger and whatever
/// was queued. During a run, a node that is not part of it joins right away
/// (this is how the roots of a plan end up in one run); a node already in
/// the run is recorded in the queue for a later run.
pub fn handle_task_trigger(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    task: TaskName,
    reason: TriggerReason,
) -> CoreStep {
    debug!(task = %task, ?reason, "trigger received");

    if scheduler.is_idle() {
        let mut triggers: BTreeSet<TaskName> = queue.drain_next().into_iter().collect();
        triggers.insert(task);
        return start_run(scheduler, triggers.into_iter().collect());
    }

    let mut step = CoreStep::carry_on();
    match scheduler.state_of(&task) {
        None => debug!(task = %task, "trigger for unknown node ignored"),
        Some(TaskRunState::NotInRun) => step.dispatch(scheduler.trigger(&task).started),
        Some(_) => queue.record_trigger(&task),
    }
    step
}

/// Handle a completion: record it, advance the run, and start a queued run
/// once this one settles.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    report: &mut RunReport,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let progress = scheduler.complete(&task, outcome.clone());

    if scheduler.graph().kind_of(&task).is_some() {
        report.record(&task, outcome);
    }
    let blocked_reason = format!("blocked by failed task '{task}'");
    for blocked in progress.failed.iter().filter(|n| **n != task) {
        report.record(blocked, TaskOutcome::Failed(blocked_reason.clone()));
    }

    let mut step = CoreStep::carry_on();
    step.dispatch(progress.started);

    if scheduler.is_idle() {
        let queued = queue.drain_next();
        if !queued.is_empty() {
            step.commands
                .extend(start_run(scheduler, queued).commands);
        }
    }

    if options.exit_when_idle && scheduler.is_idle() && queue.is_empty() {
        step.keep_running = false;
        step.commands.push(CoreCommand::RequestExit);
    }
    step
}

/// Start a run seeded with `triggers`. No triggers, no run.
pub fn start_run(scheduler: &mut Scheduler, triggers: Vec<TaskName>) -> CoreStep {
    let mut step = CoreStep::carry_on();
    if triggers.is_empty() {
        return step;
    }

    scheduler.begin_run();
    let ready = triggers
        .iter()
        .flat_map(|task| scheduler.trigger(task).started)
        .collect();
    step.dispatch(ready);
    step
}
