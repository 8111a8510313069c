// src/dag/scheduler.rs

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::node::{Node, ScheduledTask, TaskRunState};
use crate::dag::plan::Plan;
use crate::dag::state_manager::{deps_satisfied, Nodes, StateManager};
use crate::engine::{TaskName, TaskOutcome};

/// What changed in one scheduler transition.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Nodes to hand to the executor now.
    pub started: Vec<ScheduledTask>,
    /// Nodes that ended this step as failed: the failing node first, then
    /// everything it blocked.
    pub failed: Vec<TaskName>,
    /// This step settled the run and the scheduler is idle again.
    pub finished_run: bool,
}

/// Per-run state machine over a compiled [`DagGraph`].
///
/// A run starts idle-to-active on the first trigger. Triggered nodes pull
/// their downstream into the run; a node starts once every dependency has
/// succeeded, and a failure marks everything downstream of it failed. The
/// run ends when no node is pending or running.
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    nodes: Nodes,
    runs_started: u64,
    active_run: Option<u64>,
}

impl Scheduler {
    pub fn from_plan(plan: &Plan) -> Self {
        Self::new(DagGraph::from_plan(plan))
    }

    pub fn new(graph: DagGraph) -> Self {
        let nodes: BTreeMap<_, _> = graph
            .tasks()
            .filter_map(|name| {
                let kind = graph.kind_of(name)?;
                let deps = graph.dependencies_of(name).to_vec();
                Some((name.to_string(), Node::new(name.to_string(), kind, deps)))
            })
            .collect();

        Self {
            graph,
            nodes,
            runs_started: 0,
            active_run: None,
        }
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    pub fn is_idle(&self) -> bool {
        self.active_run.is_none()
    }

    pub fn run_id(&self) -> Option<u64> {
        self.active_run
    }

    /// `None` for a name the graph does not know.
    pub fn state_of(&self, task: &str) -> Option<TaskRunState> {
        self.nodes.get(task).map(|node| node.state)
    }

    /// Nodes taking part in the active run. Empty when idle.
    pub fn active_tasks(&self) -> Vec<TaskName> {
        if self.is_idle() {
            return Vec::new();
        }
        self.nodes
            .values()
            .filter(|node| node.state != TaskRunState::NotInRun)
            .map(|node| node.name.clone())
            .collect()
    }

    /// `None` for a name the graph does not know.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let node = self.nodes.get(task)?;
        Some(deps_satisfied(&self.nodes, node))
    }

    /// Open a fresh run. Per-run state resets; success history stays.
    pub fn begin_run(&mut self) {
        self.runs_started += 1;
        self.active_run = Some(self.runs_started);
        for node in self.nodes.values_mut() {
            node.state = TaskRunState::NotInRun;
        }
        debug!(run_id = self.runs_started, "run opened");
    }

    /// Pull `task` and its downstream into the active run, opening one if
    /// the scheduler is idle.
    pub fn trigger(&mut self, task: &str) -> SchedulerStep {
        let run_id = match self.active_run {
            Some(id) => id,
            None => {
                self.begin_run();
                self.runs_started
            }
        };

        let mut manager = StateManager::new(&self.graph, &mut self.nodes, run_id);
        if self.graph.kind_of(task).is_some() {
            manager.join_run(task);
        } else {
            warn!(task = %task, "trigger for unknown task; ignoring");
        }

        SchedulerStep {
            started: manager.start_ready(),
            failed: Vec::new(),
            finished_run: self.close_if_settled(),
        }
    }

    /// Record the outcome of a running node and advance the run.
    pub fn complete(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let Some(run_id) = self.active_run else {
            warn!(task = %task, "completion with no active run; ignoring");
            return SchedulerStep::default();
        };
        let Some(node) = self.nodes.get_mut(task) else {
            warn!(task = %task, "completion for unknown task; ignoring");
            return SchedulerStep::default();
        };

        let mut step = SchedulerStep::default();
        match outcome {
            TaskOutcome::Success => {
                node.state = TaskRunState::DoneSuccess;
                node.last_success = Some(run_id);
                debug!(task = %task, run_id, "task succeeded");
                step.started =
                    StateManager::new(&self.graph, &mut self.nodes, run_id).start_ready();
            }
            TaskOutcome::Failed(reason) => {
                node.state = TaskRunState::DoneFailed;
                warn!(task = %task, run_id, %reason, "task failed; failing its dependents");
                step.failed.push(task.to_string());
                step.failed.extend(
                    StateManager::new(&self.graph, &mut self.nodes, run_id).fail_downstream(task),
                );
            }
        }

        step.finished_run = self.close_if_settled();
        step
    }

    fn close_if_settled(&mut self) -> bool {
        let Some(run_id) = self.active_run else {
            return false;
        };
        if !StateManager::new(&self.graph, &mut self.nodes, run_id).is_settled() {
            return false;
        }
        info!(run_id, "run finished");
        self.active_run = None;
        true
    }
}
