// src/dag/graph.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::plan::{Plan, TaskKind};
use crate::engine::TaskName;
use crate::errors::{AssetdagError, Result};

/// Internal node structure: the task it runs plus immediate neighbours.
#[derive(Debug, Clone)]
struct DagNode {
    kind: TaskKind,
    /// Direct dependencies: nodes that must complete before this one can run.
    deps: Vec<TaskName>,
    /// Direct dependents: nodes waiting on this one.
    dependents: Vec<TaskName>,
}

/// In-memory DAG compiled from a [`Plan`], keyed by node name.
///
/// Node names are task names (`styles`, `clean`, ...). When a plan uses the
/// same task twice, later occurrences are suffixed (`reload#2`) so each
/// occurrence is scheduled on its own.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: BTreeMap<TaskName, DagNode>,
}

impl DagGraph {
    /// Compile a plan. Series edges run from every sink of one element to
    /// every source of the next; parallel elements share no edges.
    pub fn from_plan(plan: &Plan) -> Self {
        let mut graph = Self {
            nodes: BTreeMap::new(),
        };
        graph.compile(plan);
        graph
    }

    /// Returns `(sources, sinks)` of the compiled sub-plan.
    fn compile(&mut self, plan: &Plan) -> (Vec<TaskName>, Vec<TaskName>) {
        match plan {
            Plan::Task(kind) => {
                let name = self.fresh_name(*kind);
                self.nodes.insert(
                    name.clone(),
                    DagNode {
                        kind: *kind,
                        deps: Vec::new(),
                        dependents: Vec::new(),
                    },
                );
                (vec![name.clone()], vec![name])
            }
            Plan::Series(items) => {
                let mut sources: Option<Vec<TaskName>> = None;
                let mut prev_sinks: Vec<TaskName> = Vec::new();

                for item in items {
                    let (item_sources, item_sinks) = self.compile(item);
                    if item_sources.is_empty() {
                        continue;
                    }
                    for from in &prev_sinks {
                        for to in &item_sources {
                            self.add_edge(from, to);
                        }
                    }
                    if sources.is_none() {
                        sources = Some(item_sources);
                    }
                    prev_sinks = item_sinks;
                }

                (sources.unwrap_or_default(), prev_sinks)
            }
            Plan::Parallel(items) => {
                let mut sources = Vec::new();
                let mut sinks = Vec::new();
                for item in items {
                    let (s, t) = self.compile(item);
                    sources.extend(s);
                    sinks.extend(t);
                }
                (sources, sinks)
            }
        }
    }

    fn fresh_name(&self, kind: TaskKind) -> TaskName {
        let base = kind.name();
        if !self.nodes.contains_key(base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}#{n}");
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        if let Some(node) = self.nodes.get_mut(to) {
            if !node.deps.iter().any(|d| d == from) {
                node.deps.push(from.to_string());
            }
        }
        if let Some(node) = self.nodes.get_mut(from) {
            if !node.dependents.iter().any(|d| d == to) {
                node.dependents.push(to.to_string());
            }
        }
    }

    /// Return all node names.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Which task a node runs.
    pub fn kind_of(&self, name: &str) -> Option<TaskKind> {
        self.nodes.get(name).map(|n| n.kind)
    }

    /// Immediate dependencies of a node.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a node.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Nodes without dependencies: the ones a fresh run is seeded with.
    pub fn roots(&self) -> Vec<TaskName> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.deps.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// A dependency-respecting order of all nodes, or a cycle error.
    pub fn topological_order(&self) -> Result<Vec<TaskName>> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in self.nodes.keys() {
            graph.add_node(name.as_str());
        }
        for (name, node) in self.nodes.iter() {
            for dep in node.deps.iter() {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(order) => Ok(order.into_iter().map(|s| s.to_string()).collect()),
            Err(cycle) => Err(AssetdagError::DagCycle(format!(
                "cycle detected in task graph involving '{}'",
                cycle.node_id()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_plan_fans_out_after_clean() {
        let graph = DagGraph::from_plan(&Plan::exported("build").unwrap());

        assert_eq!(graph.roots(), vec!["clean".to_string()]);
        for t in ["styles", "scripts", "images"] {
            assert_eq!(graph.dependencies_of(t), &["clean".to_string()]);
        }
        assert_eq!(graph.dependents_of("clean").len(), 3);
    }

    #[test]
    fn series_after_parallel_waits_for_every_branch() {
        use TaskKind::*;
        let plan = Plan::series([
            Plan::parallel([Plan::task(Styles), Plan::task(Scripts)]),
            Plan::task(Reload),
        ]);
        let graph = DagGraph::from_plan(&plan);

        let mut deps = graph.dependencies_of("reload").to_vec();
        deps.sort();
        assert_eq!(deps, vec!["scripts".to_string(), "styles".to_string()]);
    }

    #[test]
    fn repeated_tasks_get_distinct_nodes() {
        use TaskKind::*;
        let plan = Plan::series([Plan::task(Reload), Plan::task(Images), Plan::task(Reload)]);
        let graph = DagGraph::from_plan(&plan);

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.kind_of("reload#2"), Some(Reload));
        assert_eq!(graph.dependencies_of("reload#2"), &["images".to_string()]);
    }

    #[test]
    fn topological_order_respects_series() {
        let graph = DagGraph::from_plan(&Plan::watch_handler(crate::types::AssetGroup::Scripts));
        let order = graph.topological_order().unwrap();
        let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
        assert!(pos("scripts-lint") < pos("scripts"));
        assert!(pos("scripts") < pos("reload"));
    }

    #[test]
    fn empty_series_elements_are_skipped() {
        use TaskKind::*;
        let plan = Plan::series([Plan::task(Clean), Plan::series([]), Plan::task(Images)]);
        let graph = DagGraph::from_plan(&plan);
        assert_eq!(graph.dependencies_of("images"), &["clean".to_string()]);
    }
}
