// src/tasks/mod.rs

//! The atomic tasks of the asset graph.
//!
//! Every task receives the shared [`TaskContext`] and returns an
//! `anyhow::Result`; the executor turns that into a `TaskCompleted` event.
//! CPU-bound pipelines run on the blocking pool so the runtime loop and the
//! dev server stay responsive.

pub mod clean;
pub mod images;
pub mod lint;
pub mod reload;
pub mod scripts;
pub mod serve;
pub mod styles;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::ConfigFile;
use crate::dag::TaskKind;
use crate::fs::FileSystem;
use crate::pipeline::{Asset, PipelineOutput};
use crate::server::{DevServer, LiveReload, ServerSettings};
use crate::types::AssetGroup;
use crate::watch::{slash_path, SourceFile, SourceGlob};

/// Shared state handed to every task.
#[derive(Debug)]
pub struct TaskContext {
    pub config: Arc<ConfigFile>,
    pub fs: Arc<dyn FileSystem>,
    pub live_reload: LiveReload,
    pub server: Mutex<DevServer>,
}

impl TaskContext {
    pub fn new(config: ConfigFile, fs: Arc<dyn FileSystem>) -> Self {
        let live_reload = LiveReload::new();
        let server = DevServer::new(ServerSettings::from_config(&config), live_reload.clone());
        Self {
            config: Arc::new(config),
            fs,
            live_reload,
            server: Mutex::new(server),
        }
    }

    /// Collect the source files of `group`, sorted by path.
    pub fn sources(&self, group: AssetGroup) -> Result<Vec<SourceFile>> {
        let glob = SourceGlob::new(self.config.source_glob(group))?;
        glob.collect(&*self.fs, self.config.root())
    }

    /// Read the source files of `group` into pipeline assets.
    pub fn read_assets(&self, group: AssetGroup) -> Result<Vec<Asset>> {
        self.sources(group)?
            .iter()
            .map(|file| Asset::read(&*self.fs, file))
            .collect()
    }

    pub fn dest_dir(&self, group: AssetGroup) -> Result<PathBuf> {
        self.config
            .dest_dir(group)
            .with_context(|| format!("{group} has no destination directory"))
    }

    /// A path for reports and logs: relative to the project root when
    /// possible.
    pub fn display_path(&self, path: &Path) -> String {
        slash_path(path.strip_prefix(self.config.root()).unwrap_or(path))
    }
}

/// Run one task to completion.
pub async fn execute(kind: TaskKind, ctx: &Arc<TaskContext>) -> Result<()> {
    match kind {
        TaskKind::Clean => clean::run(ctx).await,
        TaskKind::StylesLint => lint::run(ctx, AssetGroup::Styles).await,
        TaskKind::Styles => styles::run(ctx).await,
        TaskKind::ScriptsLint => lint::run(ctx, AssetGroup::Scripts).await,
        TaskKind::Scripts => scripts::run(ctx).await,
        TaskKind::Images => images::run(ctx).await,
        TaskKind::Serve => serve::run(ctx).await,
        TaskKind::Reload => reload::run(ctx).await,
        TaskKind::WatchFiles => Box::pin(watch::run(ctx)).await,
    }
}

/// Run `f` on the blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("blocking task panicked")?
}

fn log_outcome(group: AssetGroup, dest: &Path, output: &PipelineOutput) {
    if output.skipped.is_empty() {
        info!(
            %group,
            written = output.assets.len(),
            dest = %dest.display(),
            "pipeline finished"
        );
    } else {
        warn!(
            %group,
            written = output.assets.len(),
            skipped = output.skipped.len(),
            dest = %dest.display(),
            "pipeline finished with skipped files"
        );
    }
}
