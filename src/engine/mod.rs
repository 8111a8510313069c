// src/engine/mod.rs

//! Runs a task graph to completion, or keeps it alive for watch triggers.
//!
//! [`core::CoreRuntime`] decides what happens next from one event at a time
//! and never touches IO. [`runtime::Runtime`] feeds it events from a channel
//! and carries out its commands against an executor.

use std::collections::BTreeMap;

pub type TaskName = String;

/// Outcome of a task for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// Failed with a human-readable reason.
    Failed(String),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Manual trigger (the roots of the requested plan at startup).
    Manual,
    /// A watched file changed.
    FileWatch,
}

#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Stop once the graph settles with nothing queued. Set for one-shot
    /// builds, unset for watch routes.
    pub exit_when_idle: bool,
}

/// Input to the runtime loop.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    /// A task finished with a concrete outcome.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Ctrl-C or the owning task is going away.
    ShutdownRequested,
}

/// Latest outcome of every node that finished at least once.
///
/// Nodes that were failed because an upstream node failed are recorded as
/// failures too, with a reason naming the upstream node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: BTreeMap<TaskName, TaskOutcome>,
}

impl RunReport {
    pub fn record(&mut self, task: &str, outcome: TaskOutcome) {
        self.outcomes.insert(task.to_string(), outcome);
    }

    pub fn succeeded(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_success())
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Failed nodes with their reasons.
    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(n, o)| match o {
                TaskOutcome::Failed(reason) => Some((n.as_str(), reason.as_str())),
                TaskOutcome::Success => None,
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.values().any(|o| !o.is_success())
    }
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use crate::types::TriggerWhileRunningBehaviour;
pub use runtime::Runtime;
