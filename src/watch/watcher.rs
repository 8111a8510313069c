// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::watch::event_handler::{is_relevant, process_file_change, GroupRoute};

/// Keeps the OS watcher alive; dropping it stops watching and ends the
/// forwarding task.
pub struct WatcherHandle {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").field("root", &self.root).finish()
    }
}

/// Watch `root` recursively and trigger every route whose glob matches a
/// changed path.
pub fn spawn_watcher(root: impl Into<PathBuf>, routes: Vec<GroupRoute>) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    // notify calls back on its own thread.
    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) if is_relevant(&event.kind) => {
                let _ = tx.send(event);
            }
            Ok(_) => {}
            Err(err) => warn!(%err, "file watch error"),
        },
        Config::default(),
    )?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", root.display()))?;

    info!(root = %root.display(), routes = routes.len(), "watching for changes");
    tokio::spawn(forward(root.clone(), Arc::new(routes), rx));

    Ok(WatcherHandle {
        _watcher: watcher,
        root,
    })
}

async fn forward(root: PathBuf, routes: Arc<Vec<GroupRoute>>, mut rx: mpsc::UnboundedReceiver<Event>) {
    while let Some(event) = rx.recv().await {
        debug!(kind = ?event.kind, paths = ?event.paths, "change");
        for path in &event.paths {
            process_file_change(&root, path, &routes).await;
        }
    }
    debug!("watcher forwarding loop finished");
}
