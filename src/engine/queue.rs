// src/engine/queue.rs

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use super::TaskName;
use crate::types::TriggerWhileRunningBehaviour;

/// Follow-up runs requested while a run is executing.
///
/// Each batch is the trigger set of one future run. With `Queue`, a trigger
/// joins the newest batch unless that batch already has it; only then is a
/// new batch opened, up to `max_runs`. Past that the trigger is coalesced
/// into the newest batch. So with the default of one, a burst of saves
/// during a rebuild yields exactly one more rebuild. `Cancel` keeps only the
/// latest trigger.
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    max_runs: usize,
    runs: VecDeque<BTreeSet<TaskName>>,
}

impl TriggerQueue {
    /// `max_runs` is clamped to at least 1.
    pub fn new(behaviour: TriggerWhileRunningBehaviour, max_runs: usize) -> Self {
        Self {
            behaviour,
            max_runs: max_runs.max(1),
            runs: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of follow-up runs currently queued.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn record_trigger(&mut self, task: &str) {
        if self.behaviour == TriggerWhileRunningBehaviour::Cancel {
            debug!(task, "replacing queued runs with latest trigger");
            self.runs.clear();
            self.runs.push_back(BTreeSet::from([task.to_string()]));
            return;
        }

        let has_room = self.runs.len() < self.max_runs;
        match self.runs.back_mut() {
            Some(last) if !last.contains(task) => {
                last.insert(task.to_string());
                debug!(task, queued = self.runs.len(), "joined queued run");
            }
            Some(_) if !has_room => {
                debug!(task, max_runs = self.max_runs, "coalesced into queued run");
            }
            _ => {
                self.runs.push_back(BTreeSet::from([task.to_string()]));
                debug!(task, queued = self.runs.len(), "queued follow-up run");
            }
        }
    }

    /// Take the trigger set of the next queued run (empty if none).
    pub fn drain_next(&mut self) -> Vec<TaskName> {
        self.runs
            .pop_front()
            .map(|batch| batch.into_iter().collect())
            .unwrap_or_default()
    }
}
