// src/dag/state_manager.rs

//! Per-run state transitions for the scheduler's nodes.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::dag::node::{Node, ScheduledTask, TaskRunState};
use crate::dag::DagGraph;
use crate::engine::TaskName;

pub(crate) type Nodes = BTreeMap<TaskName, Node>;

/// Mutable view over the node table for one run.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    nodes: &'a mut Nodes,
    run_id: u64,
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a DagGraph, nodes: &'a mut Nodes, run_id: u64) -> Self {
        Self {
            graph,
            nodes,
            run_id,
        }
    }

    /// Pull `root` and everything downstream of it into the run.
    ///
    /// Nodes already in the run keep their state.
    pub fn join_run(&mut self, root: &str) {
        let mut seen = BTreeSet::new();
        let mut todo = vec![root.to_string()];

        while let Some(name) = todo.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let Some(node) = self.nodes.get_mut(&name) else {
                continue;
            };
            if node.state == TaskRunState::NotInRun {
                node.state = TaskRunState::Pending;
                debug!(task = %name, kind = %node.kind, run_id = self.run_id, "joined run");
            }
            todo.extend(self.graph.dependents_of(&name).iter().cloned());
        }
    }

    /// Fail every in-flight node downstream of `failed`.
    ///
    /// Returns the nodes that changed, without `failed` itself.
    pub fn fail_downstream(&mut self, failed: &str) -> Vec<TaskName> {
        let mut changed = Vec::new();
        let mut todo = self.graph.dependents_of(failed).to_vec();

        while let Some(name) = todo.pop() {
            let Some(node) = self.nodes.get_mut(&name) else {
                continue;
            };
            if !node.state.is_in_flight() {
                continue;
            }
            node.state = TaskRunState::DoneFailed;
            debug!(task = %name, upstream = %failed, "blocked by upstream failure");
            changed.push(name.clone());
            todo.extend(self.graph.dependents_of(&name).iter().cloned());
        }

        changed
    }

    /// Dispatch every `Pending` node whose dependencies are met, in name
    /// order.
    pub fn start_ready(&mut self) -> Vec<ScheduledTask> {
        let table: &Nodes = self.nodes;
        let ready: Vec<TaskName> = table
            .values()
            .filter(|node| node.state == TaskRunState::Pending && deps_satisfied(table, node))
            .map(|node| node.name.clone())
            .collect();

        let mut started = Vec::with_capacity(ready.len());
        for name in &ready {
            if let Some(node) = self.nodes.get_mut(name) {
                info!(task = %name, run_id = self.run_id, rerun = node.starts > 0, "starting task");
                started.push(node.dispatch(self.run_id));
            }
        }
        started
    }

    /// No node is waiting or running.
    pub fn is_settled(&self) -> bool {
        !self.nodes.values().any(|node| node.state.is_in_flight())
    }
}

/// Whether `node` may start.
///
/// A dependency in the run must have succeeded in it. One outside the run
/// counts once it has ever succeeded.
pub fn deps_satisfied(nodes: &Nodes, node: &Node) -> bool {
    node.deps.iter().all(|dep| {
        nodes.get(dep).is_some_and(|dep| match dep.state {
            TaskRunState::DoneSuccess => true,
            TaskRunState::NotInRun => dep.last_success.is_some(),
            _ => false,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::Plan;
    use crate::types::AssetGroup;

    fn nodes(graph: &DagGraph) -> Nodes {
        graph
            .tasks()
            .filter_map(|name| {
                let kind = graph.kind_of(name)?;
                let deps = graph.dependencies_of(name).to_vec();
                Some((name.to_string(), Node::new(name.to_string(), kind, deps)))
            })
            .collect()
    }

    #[test]
    fn failure_blocks_the_whole_downstream_chain() {
        let graph = DagGraph::from_plan(&Plan::watch_handler(AssetGroup::Scripts));
        let mut table = nodes(&graph);
        let mut mgr = StateManager::new(&graph, &mut table, 1);

        mgr.join_run("scripts-lint");
        let started = mgr.start_ready();
        assert_eq!(started.len(), 1);
        assert!(!mgr.is_settled());

        let blocked = mgr.fail_downstream("scripts-lint");
        assert_eq!(blocked, vec!["scripts".to_string(), "reload".to_string()]);
        assert_eq!(table["reload"].state, TaskRunState::DoneFailed);
        assert_eq!(table["scripts-lint"].starts, 1);
    }

    #[test]
    fn earlier_success_satisfies_a_dependency_outside_the_run() {
        let graph = DagGraph::from_plan(&Plan::exported("css").unwrap());
        let mut table = nodes(&graph);

        assert!(!deps_satisfied(&table, &table["styles"]));
        table.get_mut("styles-lint").unwrap().last_success = Some(1);
        assert!(deps_satisfied(&table, &table["styles"]));
    }
}
