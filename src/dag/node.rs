// src/dag/node.rs

//! Nodes as the scheduler tracks them.

use crate::dag::plan::TaskKind;
use crate::engine::TaskName;

/// Where a node stands in the active run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskRunState {
    /// Not part of the active run (or no run is active).
    #[default]
    NotInRun,
    /// In the run, waiting on dependencies.
    Pending,
    /// Handed to the executor.
    Running,
    DoneSuccess,
    /// Failed itself, or blocked by a failed dependency.
    DoneFailed,
}

impl TaskRunState {
    pub fn is_in_flight(self) -> bool {
        matches!(self, TaskRunState::Pending | TaskRunState::Running)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: TaskName,
    pub kind: TaskKind,
    pub deps: Vec<TaskName>,
    pub state: TaskRunState,
    /// Run in which this node last succeeded.
    pub last_success: Option<u64>,
    /// How many times the node has been started across runs.
    pub starts: u32,
}

impl Node {
    pub fn new(name: TaskName, kind: TaskKind, deps: Vec<TaskName>) -> Self {
        Self {
            name,
            kind,
            deps,
            state: TaskRunState::NotInRun,
            last_success: None,
            starts: 0,
        }
    }

    pub(crate) fn dispatch(&mut self, run_id: u64) -> ScheduledTask {
        self.state = TaskRunState::Running;
        self.starts += 1;
        ScheduledTask {
            name: self.name.clone(),
            kind: self.kind,
            run_id,
        }
    }
}

/// A node the scheduler wants the executor to run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub kind: TaskKind,
    /// Shared by everything dispatched within one run.
    pub run_id: u64,
}
