// src/watch/event_handler.rs

//! Event processing logic for file system changes.

use std::path::Path;

use notify::EventKind;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{RuntimeEvent, TaskName, TriggerReason};
use crate::watch::patterns::{project_relative, GroupWatchProfile};

/// A watch route: the group's glob plus the runtime that owns its handler graph.
#[derive(Debug, Clone)]
pub struct GroupRoute {
    pub profile: GroupWatchProfile,
    /// Root nodes of the group's handler graph; triggering these re-runs it.
    pub roots: Vec<TaskName>,
    pub runtime_tx: mpsc::Sender<RuntimeEvent>,
}

/// Whether a notify event kind describes a content or tree change.
pub fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    )
}

/// Process a single changed path and trigger the routes whose glob matches it.
///
/// Returns the number of routes triggered.
pub async fn process_file_change(root: &Path, path: &Path, routes: &[GroupRoute]) -> usize {
    let rel_str = match project_relative(root, path) {
        Some(s) => s,
        None => {
            warn!(
                "could not relativize path {:?} against root {:?}",
                path, root
            );
            return 0;
        }
    };

    debug!(?path, rel = %rel_str, "normalized event path");

    let mut triggered = 0;
    for route in routes.iter().filter(|r| r.profile.matches(&rel_str)) {
        let group = route.profile.group();
        debug!(%group, path = %rel_str, "watch match -> triggering handler graph");

        for task in &route.roots {
            if let Err(err) = route
                .runtime_tx
                .send(RuntimeEvent::TaskTriggered {
                    task: task.clone(),
                    reason: TriggerReason::FileWatch,
                })
                .await
            {
                warn!(%group, "failed to send RuntimeEvent::TaskTriggered: {err}");
            }
        }
        triggered += 1;
    }

    triggered
}
