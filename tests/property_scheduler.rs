// tests/property_scheduler.rs

use std::collections::HashSet;

use proptest::prelude::*;

use assetdag::dag::{DagGraph, Plan, Scheduler, TaskKind};
use assetdag::engine::TaskOutcome;

fn task_strategy() -> impl Strategy<Value = TaskKind> {
    proptest::sample::select(TaskKind::ALL.to_vec())
}

/// Arbitrary series/parallel compositions, including empty ones.
fn plan_strategy() -> impl Strategy<Value = Plan> {
    let leaf = task_strategy().prop_map(Plan::task);
    leaf.prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Plan::Series),
            proptest::collection::vec(inner, 0..4).prop_map(Plan::Parallel),
        ]
    })
}

proptest! {
    #[test]
    fn every_compiled_plan_has_a_topological_order(plan in plan_strategy()) {
        let graph = DagGraph::from_plan(&plan);
        let order = graph.topological_order().unwrap();

        prop_assert_eq!(order.len(), plan.tasks().len());
        for (i, name) in order.iter().enumerate() {
            for dep in graph.dependencies_of(name) {
                let pos = order.iter().position(|n| n == dep).unwrap();
                prop_assert!(pos < i, "{} scheduled before its dependency {}", name, dep);
            }
        }
    }

    #[test]
    fn scheduler_terminates_and_respects_dependencies(
        plan in plan_strategy(),
        failing in proptest::collection::vec(task_strategy(), 0..3),
    ) {
        let mut scheduler = Scheduler::from_plan(&plan);
        let roots = scheduler.graph().roots();
        let failing: HashSet<&str> = failing.iter().map(|k| k.name()).collect();

        let mut executing: Vec<String> = Vec::new();
        let mut completed: HashSet<String> = HashSet::new();
        let mut dispatched: HashSet<String> = HashSet::new();

        for root in &roots {
            for t in scheduler.trigger(root).started {
                executing.push(t.name);
            }
        }

        let mut steps = 0;
        while let Some(task) = executing.pop() {
            steps += 1;
            prop_assert!(steps <= 1000, "simulation did not terminate");
            prop_assert!(dispatched.insert(task.clone()), "{} dispatched twice", task);

            for dep in scheduler.graph().dependencies_of(&task) {
                prop_assert!(
                    completed.contains(dep),
                    "{} dispatched before dependency {}",
                    task,
                    dep
                );
            }

            let kind = scheduler.graph().kind_of(&task).unwrap();
            let outcome = if failing.contains(kind.name()) {
                TaskOutcome::Failed("injected".to_string())
            } else {
                TaskOutcome::Success
            };

            completed.insert(task.clone());
            for t in scheduler.complete(&task, outcome).started {
                executing.push(t.name);
            }
        }

        prop_assert!(scheduler.is_idle(), "run still active after all work drained");
        if failing.is_empty() {
            prop_assert_eq!(dispatched.len(), scheduler.graph().len());
        }
    }
}
